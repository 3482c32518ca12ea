//! Strongly-typed vertex identifiers.
//!
//! Used at the weld boundary, where original (possibly duplicated) and
//! welded indices would otherwise both be bare `u32`s.

use serde::{Deserialize, Serialize};

/// Index into a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for VertexId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

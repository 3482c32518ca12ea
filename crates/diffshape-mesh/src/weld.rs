//! Vertex welding.
//!
//! Mesh exporters split vertices along UV and material seams: the same
//! position appears several times, each copy referenced by different
//! faces. Sparse operators must see one row per surface point, while the
//! renderer still wants the split layout. [`weld`] collapses positions that
//! are exactly equal and returns a [`WeldMap`] to move per-vertex data
//! between the two layouts every iteration.
//!
//! Equality is exact per coordinate (`-0.0` equals `0.0`). Nearly
//! coincident vertices stay separate.

use std::collections::HashMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use diffshape_math::ExecutionContext;
use diffshape_types::{DiffShapeError, DiffShapeResult, VertexId};

use crate::field::VertexField;
use crate::mesh::TriangleMesh;

/// Mapping between an original vertex layout and its welded layout.
///
/// Welded vertices appear in order of first occurrence in the original
/// layout, so welding an already-unique mesh yields the identity map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeldMap {
    /// For each welded vertex, the first original vertex with its position.
    representatives: Vec<u32>,
    /// For each original vertex, its welded index.
    inverse: Vec<u32>,
}

/// A welded mesh and the map back to the original layout.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldedMesh {
    /// The mesh over unique vertices, faces re-indexed.
    pub mesh: TriangleMesh,
    /// Original ↔ welded index mapping.
    pub map: WeldMap,
}

impl WeldMap {
    /// The identity map over `n` vertices.
    pub fn identity(n: usize) -> Self {
        let ids: Vec<u32> = (0..n as u32).collect();
        Self {
            representatives: ids.clone(),
            inverse: ids,
        }
    }

    /// Number of welded (unique) vertices.
    #[inline]
    pub fn unique_count(&self) -> usize {
        self.representatives.len()
    }

    /// Number of original vertices.
    #[inline]
    pub fn original_count(&self) -> usize {
        self.inverse.len()
    }

    /// How many original vertices were merged away.
    #[inline]
    pub fn collapsed(&self) -> usize {
        self.original_count() - self.unique_count()
    }

    /// True if no vertex was merged and the order is unchanged.
    pub fn is_identity(&self) -> bool {
        self.collapsed() == 0 && self.inverse.iter().enumerate().all(|(i, &w)| w as usize == i)
    }

    /// Original → welded index for every original vertex.
    pub fn inverse(&self) -> &[u32] {
        &self.inverse
    }

    /// Welded → representative original index for every welded vertex.
    pub fn representatives(&self) -> &[u32] {
        &self.representatives
    }

    /// Welded index of an original vertex.
    pub fn welded_index(&self, original: VertexId) -> Option<VertexId> {
        self.inverse.get(original.index()).copied().map(VertexId)
    }

    /// Representative original index of a welded vertex.
    pub fn representative(&self, welded: VertexId) -> Option<VertexId> {
        self.representatives.get(welded.index()).copied().map(VertexId)
    }

    /// Re-expands per-unique-vertex data to the original layout.
    pub fn expand(&self, unique: &VertexField) -> DiffShapeResult<VertexField> {
        self.check_unique_len(unique.len())?;
        unique.gather(&self.inverse)
    }

    /// Re-expands per-unique-vertex points to the original layout.
    pub fn expand_points(&self, unique: &[DVec3]) -> DiffShapeResult<Vec<DVec3>> {
        self.check_unique_len(unique.len())?;
        Ok(self.inverse.iter().map(|&w| unique[w as usize]).collect())
    }

    /// Sums per-original-vertex data onto the welded vertices.
    ///
    /// Adjoint of [`expand`](Self::expand): a gradient with respect to the
    /// expanded positions becomes the gradient with respect to the unique
    /// positions.
    pub fn reduce(&self, original: &VertexField) -> DiffShapeResult<VertexField> {
        if original.len() != self.original_count() {
            return Err(DiffShapeError::dimension(
                "original-layout field",
                self.original_count(),
                original.len(),
            ));
        }
        original.scatter_add(&self.inverse, self.unique_count())
    }

    fn check_unique_len(&self, len: usize) -> DiffShapeResult<()> {
        if len != self.unique_count() {
            return Err(DiffShapeError::dimension(
                "welded-layout field",
                self.unique_count(),
                len,
            ));
        }
        Ok(())
    }
}

/// Bit pattern used as the equality key; `-0.0` is folded onto `0.0`.
#[inline]
fn coordinate_key(x: f64) -> u64 {
    if x == 0.0 {
        0
    } else {
        x.to_bits()
    }
}

#[inline]
fn position_key(p: DVec3) -> [u64; 3] {
    [coordinate_key(p.x), coordinate_key(p.y), coordinate_key(p.z)]
}

/// Collapses exactly duplicated vertex positions.
///
/// Returns the unique-vertex mesh (first-occurrence order, faces
/// re-indexed) and the map back to the original layout. Fails on an
/// out-of-range face index before doing any work.
pub fn weld(mesh: &TriangleMesh, ctx: &ExecutionContext) -> DiffShapeResult<WeldedMesh> {
    mesh.validate()?;

    let n = mesh.vertex_count();
    let keys = ctx.map_indexed(n, |i| position_key(mesh.positions[i]));

    let mut first_seen: HashMap<[u64; 3], u32> = HashMap::with_capacity(n);
    let mut representatives: Vec<u32> = Vec::with_capacity(n);
    let mut inverse: Vec<u32> = Vec::with_capacity(n);

    for (i, key) in keys.into_iter().enumerate() {
        let next = representatives.len() as u32;
        let welded = *first_seen.entry(key).or_insert(next);
        if welded == next {
            representatives.push(i as u32);
        }
        inverse.push(welded);
    }

    let positions: Vec<DVec3> = representatives
        .iter()
        .map(|&r| mesh.positions[r as usize])
        .collect();
    let faces = ctx.map_indexed(mesh.face_count(), |t| {
        let [a, b, c] = mesh.faces[t];
        [inverse[a as usize], inverse[b as usize], inverse[c as usize]]
    });

    let map = WeldMap {
        representatives,
        inverse,
    };

    tracing::debug!(
        original = map.original_count(),
        unique = map.unique_count(),
        collapsed = map.collapsed(),
        "welded duplicate vertices"
    );

    Ok(WeldedMesh {
        mesh: TriangleMesh { positions, faces },
        map,
    })
}

//! # diffshape-mesh
//!
//! Triangle mesh representation and the per-vertex machinery around it.
//!
//! ## Key Types
//!
//! - [`TriangleMesh`] — positions (`glam::DVec3`) plus triangle indices.
//! - [`VertexField`] — a Structure-of-Arrays N×3 buffer for positions,
//!   differential coordinates and gradients.
//! - [`WeldMap`] — produced by [`weld`](weld::weld); maps between the
//!   original (seam-duplicated) layout and the unique-vertex layout.
//! - [`Topology`] — unique edges, degrees, components.
//! - Angle-weighted normals in [`normals`], procedural meshes in [`generators`].

pub mod field;
pub mod generators;
pub mod mesh;
pub mod normals;
pub mod topology;
pub mod weld;

pub use field::VertexField;
pub use mesh::TriangleMesh;
pub use normals::Normals;
pub use topology::Topology;
pub use weld::{WeldMap, WeldedMesh};

pub use glam::DVec3;

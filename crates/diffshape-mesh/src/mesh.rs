//! Core triangle mesh type.
//!
//! Faces always index into the mesh's own position array, whichever layout
//! (original or welded) that array is in.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use diffshape_types::{DiffShapeError, DiffShapeResult};

/// A triangle mesh: vertex positions and counter-clockwise triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<DVec3>,
    /// Triangle indices into `positions`.
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Creates a mesh and validates it.
    pub fn new(positions: Vec<DVec3>, faces: Vec<[u32; 3]>) -> DiffShapeResult<Self> {
        let mesh = Self { positions, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the position of vertex `i`.
    #[inline]
    pub fn position(&self, i: usize) -> DVec3 {
        self.positions[i]
    }

    /// Returns the three vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [usize; 3] {
        let [a, b, c] = self.faces[t];
        [a as usize, b as usize, c as usize]
    }

    /// Returns the three corner positions of triangle `t`.
    #[inline]
    pub fn triangle_positions(&self, t: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangle(t);
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Validates mesh integrity.
    ///
    /// Checks:
    /// - Triangle indices are within bounds
    /// - Vertex coordinates are finite
    ///
    /// Zero-area and repeated-index triangles are tolerated.
    pub fn validate(&self) -> DiffShapeResult<()> {
        check_face_indices(self.positions.len(), &self.faces)?;

        if let Some(i) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(DiffShapeError::InvalidMesh(format!(
                "Vertex {} has a non-finite coordinate: {:?}",
                i, self.positions[i]
            )));
        }
        Ok(())
    }

    /// Constructs a mesh from flat buffers `[x0, y0, z0, x1, ...]` and
    /// `[t0v0, t0v1, t0v2, t1v0, ...]`.
    pub fn from_flat(positions: &[f64], indices: &[u32]) -> DiffShapeResult<Self> {
        if positions.len() % 3 != 0 {
            return Err(DiffShapeError::InvalidMesh(
                "Flat positions length not divisible by 3".into(),
            ));
        }
        if indices.len() % 3 != 0 {
            return Err(DiffShapeError::InvalidMesh(
                "Index count is not divisible by 3".into(),
            ));
        }

        let positions = positions
            .chunks_exact(3)
            .map(|p| DVec3::new(p[0], p[1], p[2]))
            .collect();
        let faces = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();

        Self::new(positions, faces)
    }

    /// Returns positions as a flat `[x0, y0, z0, x1, ...]` buffer.
    pub fn flat_positions(&self) -> Vec<f64> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }

    /// Returns a copy of this mesh with new positions and the same faces.
    pub fn with_positions(&self, positions: Vec<DVec3>) -> DiffShapeResult<Self> {
        if positions.len() != self.positions.len() {
            return Err(DiffShapeError::dimension(
                "replacement positions",
                self.positions.len(),
                positions.len(),
            ));
        }
        Ok(Self {
            positions,
            faces: self.faces.clone(),
        })
    }

    /// Mean length over the three edges of every face.
    ///
    /// Interior edges are counted once per incident face. Returns 0 for a
    /// mesh without faces.
    pub fn average_edge_length(&self) -> f64 {
        if self.faces.is_empty() {
            return 0.0;
        }
        let total: f64 = (0..self.face_count())
            .map(|t| {
                let [p0, p1, p2] = self.triangle_positions(t);
                (p1 - p2).length() + (p0 - p2).length() + (p0 - p1).length()
            })
            .sum();
        total / self.face_count() as f64 / 3.0
    }
}

/// Fails with [`DiffShapeError::FaceIndexOutOfRange`] on the first face
/// that references a vertex `>= vertex_count`.
pub fn check_face_indices(vertex_count: usize, faces: &[[u32; 3]]) -> DiffShapeResult<()> {
    for (face, tri) in faces.iter().enumerate() {
        if let Some(&vertex) = tri.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(DiffShapeError::FaceIndexOutOfRange {
                face,
                vertex,
                vertex_count,
            });
        }
    }
    Ok(())
}

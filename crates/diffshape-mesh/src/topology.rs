//! Mesh topology queries.
//!
//! Builds edge and adjacency data from the triangle index buffer. The
//! uniform Laplacian is defined entirely by the edge set and the vertex
//! degrees computed here.

use std::collections::BTreeMap;

use diffshape_types::DiffShapeResult;

use crate::mesh::{check_face_indices, TriangleMesh};

/// Precomputed topology information for a triangle mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// Number of vertices the faces index into.
    pub vertex_count: usize,

    /// Unique undirected edges as `[v_min, v_max]`, sorted.
    pub edges: Vec<[u32; 2]>,

    /// Number of faces incident to each edge, parallel to `edges`.
    /// Boundary edges have exactly 1.
    pub edge_face_counts: Vec<u32>,

    /// For each vertex, its neighbors through unique edges, sorted.
    pub neighbors: Vec<Vec<u32>>,

    /// For each vertex, the faces that reference it.
    pub vertex_faces: Vec<Vec<u32>>,
}

impl Topology {
    /// Build topology from an index buffer over `vertex_count` vertices.
    ///
    /// An edge whose two endpoints coincide (a degenerate face such as
    /// `[3, 3, 5]`) is not recorded.
    pub fn build(faces: &[[u32; 3]], vertex_count: usize) -> DiffShapeResult<Self> {
        check_face_indices(vertex_count, faces)?;

        let mut vertex_faces: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        // Key: (min_vertex, max_vertex) to canonicalize edge direction
        let mut edge_map: BTreeMap<(u32, u32), u32> = BTreeMap::new();

        for (t, &[a, b, c]) in faces.iter().enumerate() {
            for v in [a, b, c] {
                let list = &mut vertex_faces[v as usize];
                if list.last() != Some(&(t as u32)) {
                    list.push(t as u32);
                }
            }
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                if v0 == v1 {
                    continue;
                }
                let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
                *edge_map.entry(key).or_default() += 1;
            }
        }

        let mut edges = Vec::with_capacity(edge_map.len());
        let mut edge_face_counts = Vec::with_capacity(edge_map.len());
        let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        for (&(v0, v1), &count) in &edge_map {
            edges.push([v0, v1]);
            edge_face_counts.push(count);
            neighbors[v0 as usize].push(v1);
            neighbors[v1 as usize].push(v0);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }

        Ok(Self {
            vertex_count,
            edges,
            edge_face_counts,
            neighbors,
            vertex_faces,
        })
    }

    /// Build topology from a mesh.
    pub fn from_mesh(mesh: &TriangleMesh) -> DiffShapeResult<Self> {
        Self::build(&mesh.faces, mesh.vertex_count())
    }

    /// Number of unique undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of distinct neighbors of vertex `v`.
    pub fn degree(&self, v: usize) -> usize {
        self.neighbors[v].len()
    }

    /// Degree of every vertex.
    pub fn degrees(&self) -> Vec<usize> {
        self.neighbors.iter().map(Vec::len).collect()
    }

    /// Returns the number of boundary edges (edges with only 1 adjacent face).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_face_counts.iter().filter(|&&c| c == 1).count()
    }

    /// Edges shared by more than two faces.
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_face_counts.iter().filter(|&&c| c > 2).count()
    }

    /// Returns true if the mesh is closed (no boundary edges).
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count() == 0
    }

    /// Vertices referenced by no face.
    pub fn isolated_vertices(&self) -> Vec<u32> {
        self.vertex_faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_empty())
            .map(|(v, _)| v as u32)
            .collect()
    }

    /// Number of edge-connected components. Isolated vertices count as
    /// their own component.
    pub fn connected_components(&self) -> usize {
        let mut parent: Vec<usize> = (0..self.vertex_count).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let mut components = self.vertex_count;
        for &[a, b] in &self.edges {
            let ra = find(&mut parent, a as usize);
            let rb = find(&mut parent, b as usize);
            if ra != rb {
                parent[ra] = rb;
                components -= 1;
            }
        }
        components
    }

    /// Euler characteristic `V - E + F` for a mesh with `face_count` faces.
    pub fn euler_characteristic(&self, face_count: usize) -> i64 {
        self.vertex_count as i64 - self.edges.len() as i64 + face_count as i64
    }
}

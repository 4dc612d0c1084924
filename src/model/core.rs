//! Triangle soup types produced by the STL loader

use nalgebra::{Point3, Vector3};

use crate::mesh_ops::{self, Aabb};

/// A triangle with three vertex positions and a face normal
///
/// The normal is always derived from the vertex winding, never read from a
/// file. Degenerate triangles carry the zero vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex positions in winding order
    pub vertices: [Point3<f32>; 3],
    /// Unit face normal, or zero for degenerate triangles
    pub normal: Vector3<f32>,
}

impl Triangle {
    /// Create a triangle, deriving its normal from the winding
    pub fn new(v1: Point3<f32>, v2: Point3<f32>, v3: Point3<f32>) -> Self {
        Self {
            vertices: [v1, v2, v3],
            normal: mesh_ops::face_normal(&v1, &v2, &v3),
        }
    }

    /// Create a triangle with an explicit normal
    pub fn with_normal(vertices: [Point3<f32>; 3], normal: Vector3<f32>) -> Self {
        Self { vertices, normal }
    }

    /// Smallest Z coordinate of the three vertices
    pub fn min_z(&self) -> f32 {
        self.vertices[0]
            .z
            .min(self.vertices[1].z)
            .min(self.vertices[2].z)
    }

    /// Largest Z coordinate of the three vertices
    pub fn max_z(&self) -> f32 {
        self.vertices[0]
            .z
            .max(self.vertices[1].z)
            .max(self.vertices[2].z)
    }
}

/// A flat-shaded triangle soup
///
/// Positions and normals are stored as flat `f32` buffers, ready to be
/// uploaded to a rendering backend. Every triangle contributes 9 position
/// values and 9 normal values (its face normal repeated once per vertex),
/// so `vertices().len() == normals().len() == 9 * triangle_count()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
    normals: Vec<f32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new mesh with room for `triangles` triangles
    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(triangles * 9),
            normals: Vec::with_capacity(triangles * 9),
        }
    }

    /// Build a mesh from triangles, recomputing every face normal
    pub fn from_triangles<I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = [Point3<f32>; 3]>,
    {
        let mut mesh = Mesh::new();
        for [v1, v2, v3] in triangles {
            mesh.push_triangle(v1, v2, v3);
        }
        mesh
    }

    /// Append a triangle; its face normal is derived from the winding
    pub fn push_triangle(&mut self, v1: Point3<f32>, v2: Point3<f32>, v3: Point3<f32>) {
        let normal = mesh_ops::face_normal(&v1, &v2, &v3);
        for v in [v1, v2, v3] {
            self.vertices.extend_from_slice(&[v.x, v.y, v.z]);
            self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
        }
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 9
    }

    /// Whether the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Flat vertex position buffer (x, y, z per vertex, 3 vertices per triangle)
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Flat per-vertex normal buffer, parallel to [`Mesh::vertices`]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// Get a triangle by index
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let start = index.checked_mul(9)?;
        let v = self.vertices.get(start..start.checked_add(9)?)?;
        let n = self.normals.get(start..start + 3)?;
        Some(Triangle::with_normal(
            [
                Point3::new(v[0], v[1], v[2]),
                Point3::new(v[3], v[4], v[5]),
                Point3::new(v[6], v[7], v[8]),
            ],
            Vector3::new(n[0], n[1], n[2]),
        ))
    }

    /// Iterate over all triangles
    pub fn triangles(&self) -> impl ExactSizeIterator<Item = Triangle> + '_ {
        self.vertices
            .chunks_exact(9)
            .zip(self.normals.chunks_exact(9))
            .map(|(v, n)| {
                Triangle::with_normal(
                    [
                        Point3::new(v[0], v[1], v[2]),
                        Point3::new(v[3], v[4], v[5]),
                        Point3::new(v[6], v[7], v[8]),
                    ],
                    Vector3::new(n[0], n[1], n[2]),
                )
            })
    }

    /// Axis-aligned bounding box of all vertices, or `None` for an empty mesh
    pub fn aabb(&self) -> Option<Aabb> {
        mesh_ops::compute_aabb(
            self.vertices
                .chunks_exact(3)
                .map(|v| Point3::new(v[0], v[1], v[2])),
        )
    }
}

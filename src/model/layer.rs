//! Layers: a mesh placed in the scene with a material

use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

use super::core::{Mesh, Triangle};
use super::material::MaterialId;
use crate::error::{Error, Result};
use crate::mesh_ops::{self, Aabb};

/// Placement of a layer's mesh in the scene
///
/// The model matrix is composed as `M = R * T * S`: the scale is applied to
/// the vertex first, then the translation, then the rotation. The rotation
/// therefore turns the translated mesh about the world origin, not about the
/// mesh's own centre. Existing volumes depend on this order; changing it
/// changes output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation along X, Y and Z
    pub translation: Vector3<f32>,
    /// Rotation about X, Y and Z in degrees, applied X first, then Y, then Z
    pub rotation: Vector3<f32>,
    /// Per-axis scale factors
    pub scale: Vector3<f32>,
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Set the translation
    pub fn with_translation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.translation = Vector3::new(x, y, z);
        self
    }

    /// Set the rotation angles in degrees
    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    /// Set the per-axis scale
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = Vector3::new(x, y, z);
        self
    }

    /// Rotation matrix `Rz * Ry * Rx`
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Rotation3::from_euler_angles(
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
        .to_homogeneous()
    }

    /// Model matrix `R * T * S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.rotation_matrix()
            * Matrix4::new_translation(&self.translation)
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Inverse-transpose of the upper 3x3 of the model matrix
    ///
    /// Fails when the model matrix is singular (a zero scale factor).
    pub fn normal_matrix(&self) -> Result<Matrix3<f32>> {
        let upper: Matrix3<f32> = self.model_matrix().fixed_view::<3, 3>(0, 0).into_owned();
        upper
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .ok_or_else(|| {
                Error::config(format!(
                    "transform with scale ({}, {}, {}) is not invertible",
                    self.scale.x, self.scale.y, self.scale.z
                ))
            })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// One mesh tagged with a material and placed in the scene
///
/// The world-space geometry is baked once at construction; a layer is
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    mesh: Mesh,
    material: MaterialId,
    transform: Transform,
    geometry: Vec<Triangle>,
}

impl Layer {
    /// Create a layer, transforming the mesh into world space
    pub fn new(
        name: impl Into<String>,
        mesh: Mesh,
        material: MaterialId,
        transform: Transform,
    ) -> Result<Self> {
        let model = transform.model_matrix();
        let normal_matrix = transform.normal_matrix()?;

        let geometry = mesh
            .triangles()
            .map(|triangle| {
                let [v1, v2, v3] = triangle.vertices;
                Triangle::with_normal(
                    [
                        model.transform_point(&v1),
                        model.transform_point(&v2),
                        model.transform_point(&v3),
                    ],
                    mesh_ops::transform_normal(&normal_matrix, &triangle.normal),
                )
            })
            .collect();

        Ok(Self {
            name: name.into(),
            mesh,
            material,
            transform,
            geometry,
        })
    }

    /// Human-readable layer name (usually the source file)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source mesh in model space
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Material written for voxels inside this layer
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// The layer's placement
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Render-ready triangles in world space
    pub fn geometry(&self) -> &[Triangle] {
        &self.geometry
    }

    /// World-space bounding box, or `None` when the layer has no triangles
    pub fn world_aabb(&self) -> Option<Aabb> {
        mesh_ops::compute_aabb(self.geometry.iter().flat_map(|t| t.vertices))
    }
}

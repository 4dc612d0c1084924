//! Triangle mesh operations using nalgebra
//!
//! This module provides the geometric helpers used while loading and placing
//! layers:
//! - Face normal calculation
//! - Bounding box calculation
//! - Normal transformation
//! - Signed volume, used to detect inside-out meshes

use nalgebra::{Matrix3, Point3, Vector3};

use crate::model::Mesh;

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Point3<f32>,
    /// Maximum corner
    pub max: Point3<f32>,
}

impl Aabb {
    /// Smallest box containing both boxes
    pub fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

/// Calculate the normal vector for a single triangle face
///
/// The normal is `normalize(cross(v2 - v1, v3 - v1))`. If the triangle is
/// degenerate (zero area), returns a zero vector.
///
/// # Example
/// ```
/// use nalgebra::Point3;
/// use stl2vox::mesh_ops::face_normal;
///
/// let normal = face_normal(
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(1.0, 0.0, 0.0),
///     &Point3::new(0.0, 1.0, 0.0),
/// );
/// assert_eq!(normal.z, 1.0);
/// ```
pub fn face_normal(v1: &Point3<f32>, v2: &Point3<f32>, v3: &Point3<f32>) -> Vector3<f32> {
    (v2 - v1)
        .cross(&(v3 - v1))
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros)
}

/// Transform a face normal with a normal matrix and renormalize it
///
/// Zero normals (degenerate faces) stay zero.
pub fn transform_normal(normal_matrix: &Matrix3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    (normal_matrix * normal)
        .try_normalize(0.0)
        .unwrap_or_else(Vector3::zeros)
}

/// Compute the bounding box of a set of points
///
/// Returns `None` when the iterator is empty.
pub fn compute_aabb<I>(points: I) -> Option<Aabb>
where
    I: IntoIterator<Item = Point3<f32>>,
{
    let mut points = points.into_iter();
    let first = points.next()?;

    Some(points.fold(
        Aabb {
            min: first,
            max: first,
        },
        |aabb, p| Aabb {
            min: aabb.min.inf(&p),
            max: aabb.max.sup(&p),
        },
    ))
}

/// Compute the signed volume of a mesh using the divergence theorem
///
/// For a closed mesh with outward-facing winding the volume is positive.
/// A negative volume means the triangles are wound inside-out, which turns
/// the solid into its complement during classification.
pub fn compute_mesh_signed_volume(mesh: &Mesh) -> f64 {
    let volume: f64 = mesh
        .triangles()
        .map(|triangle| {
            let [a, b, c] = triangle.vertices.map(|v| v.coords.cast::<f64>());
            a.dot(&b.cross(&c))
        })
        .sum();

    volume / 6.0
}

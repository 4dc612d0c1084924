//! Scene: volume dimensions and the ordered layer list

use super::layer::Layer;
use crate::error::{Error, Result};

/// Volume dimensions in voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Cells along X
    pub x: usize,
    /// Cells along Y
    pub y: usize,
    /// Slices along Z
    pub z: usize,
}

impl Dimensions {
    /// Create dimensions, rejecting zero extents and volumes too large to address
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self> {
        for (axis, value) in [("x", x), ("y", y), ("z", z)] {
            if value == 0 {
                return Err(Error::config(format!(
                    "dimension-{} must be a positive integer",
                    axis
                )));
            }
        }

        let dimensions = Self { x, y, z };
        if dimensions.volume_len().is_none() {
            return Err(Error::config(format!(
                "volume {}x{}x{} is too large",
                x, y, z
            )));
        }
        Ok(dimensions)
    }

    /// Bytes in one slice, `x * y`
    pub fn slice_len(&self) -> Option<usize> {
        self.x.checked_mul(self.y)
    }

    /// Bytes in the whole volume, `x * y * z`
    pub fn volume_len(&self) -> Option<u64> {
        (self.x as u64)
            .checked_mul(self.y as u64)?
            .checked_mul(self.z as u64)
    }
}

/// Everything a run voxelizes
///
/// Layer order is compositing precedence: where layers overlap, the later
/// layer wins.
#[derive(Debug, Clone)]
pub struct Scene {
    dimensions: Dimensions,
    layers: Vec<Layer>,
    max_z: f32,
}

impl Scene {
    /// Create a scene; at least one layer is required
    pub fn new(dimensions: Dimensions, layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::config("at least one layer is required"));
        }

        let max_z = layers
            .iter()
            .filter_map(|layer| layer.world_aabb())
            .map(|aabb| aabb.max.z)
            .reduce(f32::max)
            .unwrap_or(0.0);

        Ok(Self {
            dimensions,
            layers,
            max_z,
        })
    }

    /// Volume dimensions
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Layers in compositing order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Largest world Z over every layer's geometry
    ///
    /// The far clipping plane is placed one unit beyond this so every solid
    /// is closed at its far end.
    pub fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Total triangles over all layers
    pub fn triangle_count(&self) -> usize {
        self.layers.iter().map(|l| l.mesh().triangle_count()).sum()
    }
}

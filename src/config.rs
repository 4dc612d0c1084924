//! Run configuration
//!
//! A [`VoxelizerConfig`] is built either in code, with the builder methods,
//! or from a TOML scene file:
//!
//! ```toml
//! output_path = "scene.ui8"
//!
//! [dimensions]
//! x = 512
//! y = 512
//! z = 256
//!
//! [[layers]]
//! path = "body.stl"
//! material = 200
//! translation = [0.0, 0.0, 0.0]
//! rotation = [0.0, 0.0, 90.0]
//! scale = [1.0, 1.0, 1.0]
//! ```
//!
//! Configuration is only checked by [`VoxelizerConfig::validate`], which the
//! driver calls before touching any file.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{Dimensions, MaterialId, Transform};

/// Output path used when none is configured
pub const DEFAULT_OUTPUT_PATH: &str = "scene.ui8";

/// One mesh to voxelize and the material it fills
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    /// Binary STL file
    pub path: PathBuf,
    /// Material id, must be in `1..=255`
    pub material: u32,
    /// Placement of the mesh in the volume
    pub transform: Transform,
}

impl LayerConfig {
    /// Layer with the identity transform
    pub fn new(path: impl Into<PathBuf>, material: u32) -> Self {
        Self {
            path: path.into(),
            material,
            transform: Transform::identity(),
        }
    }

    /// Set the layer transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Configuration for one voxelization run
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelizerConfig {
    dimensions: [usize; 3],
    layers: Vec<LayerConfig>,
    output_path: PathBuf,
}

impl VoxelizerConfig {
    /// Configuration for an `x` × `y` × `z` volume with no layers yet
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self {
            dimensions: [x, y, z],
            layers: Vec::new(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }

    /// Append a layer; later layers win where layers overlap
    pub fn with_layer(mut self, layer: LayerConfig) -> Self {
        self.layers.push(layer);
        self
    }

    /// Set where the volume is written
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Replace the volume dimensions
    pub fn with_dimensions(mut self, x: usize, y: usize, z: usize) -> Self {
        self.dimensions = [x, y, z];
        self
    }

    /// Raw (unvalidated) dimensions as `[x, y, z]`
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Layers in compositing order
    pub fn layers(&self) -> &[LayerConfig] {
        &self.layers
    }

    /// Output volume path
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Check everything that can be checked without reading meshes
    ///
    /// Dimensions must be positive, at least one layer is required, every
    /// material id must be in `1..=255` and every transform invertible.
    pub fn validate(&self) -> Result<Dimensions> {
        let [x, y, z] = self.dimensions;
        let dimensions = Dimensions::new(x, y, z)?;

        if self.layers.is_empty() {
            return Err(Error::config("at least one (mesh, material) layer is required"));
        }

        for layer in &self.layers {
            MaterialId::try_from(layer.material).map_err(|e| {
                Error::config(format!("layer {}: {}", layer.path.display(), config_message(e)))
            })?;
            layer.transform.normal_matrix().map_err(|e| {
                Error::config(format!("layer {}: {}", layer.path.display(), config_message(e)))
            })?;
        }

        Ok(dimensions)
    }

    /// Load a TOML scene file
    ///
    /// Relative layer paths are resolved against the directory holding the
    /// scene file.
    pub fn from_scene_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read scene file {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        Self::from_toml_str(&text, base_dir)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), config_message(e))))
    }

    /// Parse a TOML scene description
    ///
    /// Relative layer paths are joined onto `base_dir`.
    pub fn from_toml_str(text: &str, base_dir: impl AsRef<Path>) -> Result<Self> {
        let scene: SceneFile =
            toml::from_str(text).map_err(|e| Error::config(format!("malformed scene: {}", e)))?;
        let base_dir = base_dir.as_ref();

        let dimensions = scene
            .dimensions
            .map(|d| [d.x, d.y, d.z])
            .unwrap_or([0, 0, 0]);

        let layers = scene
            .layers
            .into_iter()
            .map(|layer| {
                let transform = Transform {
                    translation: Vector3::from(layer.translation),
                    rotation: Vector3::from(layer.rotation),
                    scale: Vector3::from(layer.scale),
                };
                LayerConfig::new(base_dir.join(layer.path), layer.material)
                    .with_transform(transform)
            })
            .collect();

        Ok(Self {
            dimensions,
            layers,
            output_path: scene
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
        })
    }
}

/// Strip the error code so nested configuration messages read cleanly
fn config_message(error: Error) -> String {
    match error {
        Error::Config(message) => message,
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneFile {
    output_path: Option<PathBuf>,
    dimensions: Option<SceneDimensions>,
    #[serde(default)]
    layers: Vec<SceneLayer>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneDimensions {
    x: usize,
    y: usize,
    z: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneLayer {
    path: PathBuf,
    material: u32,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

//! # stl2vox
//!
//! Converts triangulated solids (binary STL meshes) into multi-material voxel
//! volumes.
//!
//! Each input mesh is a *layer* tagged with a material id in `1..=255`. The
//! volume is produced one Z slice at a time: every layer is classified at
//! the slice plane, the per-layer results are composited (later layers win
//! where they overlap) and the slice is appended to the output.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Binary STL reading with precise truncation errors
//! - Per-layer translation, rotation and non-uniform scale
//! - Headerless one-byte-per-voxel output, `X * Y * Z` bytes
//! - TOML scene files
//! - Slice preview and PNG export (`preview` feature)
//!
//! ## Output format
//!
//! The byte at offset `(d - 1) * X * Y + y * X + x` is the material of cell
//! `(x, y)` in slice `d` (1-based). Zero means empty.
//!
//! ## Example
//!
//! ```no_run
//! use stl2vox::{LayerConfig, Transform, Voxelizer, VoxelizerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VoxelizerConfig::new(256, 256, 128)
//!     .with_layer(LayerConfig::new("housing.stl", 1))
//!     .with_layer(
//!         LayerConfig::new("magnet.stl", 42)
//!             .with_transform(Transform::identity().with_translation(10.0, 10.0, 0.0)),
//!     )
//!     .with_output_path("motor.ui8");
//!
//! let report = Voxelizer::new(config).run()?;
//! println!("{} voxels filled", report.filled_voxels());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classifier;
pub mod compositor;
pub mod config;
pub mod driver;
pub mod error;
pub mod mesh_ops;
pub mod model;
pub mod preview;
pub mod raster;
pub mod stl;
pub mod writer;

pub use classifier::{ClassificationBuffer, SliceClassifier};
pub use compositor::LayerCompositor;
pub use config::{LayerConfig, VoxelizerConfig};
pub use driver::{
    DriverState, LayerSummary, Progress, SliceRenderer, VoxelizationReport, Voxelizer, load_scene,
};
pub use error::{Error, ErrorContext, Result};
pub use model::{
    Dimensions, EMPTY, Layer, MaterialId, Mesh, Scene, Slice, Transform, Triangle, decode_channel,
};
pub use preview::{PreviewSession, SliceCursor};
pub use raster::{CpuRasterizer, OrthoView, RenderBackend};
pub use writer::VolumeWriter;

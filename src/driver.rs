//! Voxelization driver
//!
//! A [`Voxelizer`] runs one conversion from start to finish:
//!
//! ```text
//! Configuring -> Loading -> Slicing { 1..=Z } -> Finalizing -> Done
//!       \____________\____________\_________________\______> Failed
//! ```
//!
//! Every mesh is loaded before the output file is created, so a malformed
//! mesh never leaves a file behind. Once slicing has started, a failure
//! leaves the slices already written on disk; the volume is then shorter than
//! `X * Y * Z` bytes and must be treated as incomplete.
//!
//! # Example
//!
//! ```no_run
//! use stl2vox::{LayerConfig, Voxelizer, VoxelizerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VoxelizerConfig::new(128, 128, 64)
//!     .with_layer(LayerConfig::new("body.stl", 200))
//!     .with_layer(LayerConfig::new("insert.stl", 7))
//!     .with_output_path("part.ui8");
//!
//! let report = Voxelizer::new(config).run()?;
//! println!("{} bytes written", report.bytes_written);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use crate::classifier::{ClassificationBuffer, SliceClassifier};
use crate::compositor::LayerCompositor;
use crate::config::VoxelizerConfig;
use crate::error::{Error, Result};
use crate::mesh_ops;
use crate::model::{Dimensions, EMPTY, Layer, MaterialId, Mesh, Scene, Slice};
use crate::raster::{CpuRasterizer, RenderBackend};
use crate::writer::VolumeWriter;

/// Where a [`Voxelizer`] is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Checking the configuration
    Configuring,
    /// Reading meshes and acquiring the render target
    Loading,
    /// Producing the slice at `depth` (1-based)
    Slicing {
        /// Slice being produced
        depth: usize,
    },
    /// Flushing the output and releasing the render target
    Finalizing,
    /// The volume was written completely
    Done,
    /// The run stopped at its first error
    Failed,
}

impl DriverState {
    /// Whether the run is over, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(self, DriverState::Done | DriverState::Failed)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Configuring => write!(f, "configuring"),
            DriverState::Loading => write!(f, "loading"),
            DriverState::Slicing { depth } => write!(f, "slicing {}", depth),
            DriverState::Finalizing => write!(f, "finalizing"),
            DriverState::Done => write!(f, "done"),
            DriverState::Failed => write!(f, "failed"),
        }
    }
}

/// Slice progress, reported once per slice after it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Slice just written (1-based)
    pub depth: usize,
    /// Total number of slices
    pub total: usize,
}

impl Progress {
    /// Completed share of the run in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        self.depth as f32 / self.total as f32
    }
}

/// Per-layer line of a [`VoxelizationReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    /// Layer name (the mesh path)
    pub name: String,
    /// Material the layer fills
    pub material: MaterialId,
    /// Triangles read from the mesh
    pub triangles: usize,
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelizationReport {
    /// Volume dimensions
    pub dimensions: Dimensions,
    /// Layers in compositing order
    pub layers: Vec<LayerSummary>,
    /// Bytes written to the output
    pub bytes_written: u64,
    /// Non-empty voxels per material id
    pub material_voxels: BTreeMap<u8, u64>,
}

impl VoxelizationReport {
    fn new(scene: &Scene) -> Self {
        Self {
            dimensions: scene.dimensions(),
            layers: scene
                .layers()
                .iter()
                .map(|layer| LayerSummary {
                    name: layer.name().to_string(),
                    material: layer.material(),
                    triangles: layer.mesh().triangle_count(),
                })
                .collect(),
            bytes_written: 0,
            material_voxels: BTreeMap::new(),
        }
    }

    fn record(&mut self, slice: &Slice) {
        for &cell in slice.as_bytes() {
            if cell != EMPTY {
                *self.material_voxels.entry(cell).or_default() += 1;
            }
        }
    }

    /// Total non-empty voxels
    pub fn filled_voxels(&self) -> u64 {
        self.material_voxels.values().sum()
    }
}

/// Read every layer's mesh and build the scene
///
/// Validates `config` first; the first unreadable mesh aborts loading.
pub fn load_scene(config: &VoxelizerConfig) -> Result<Scene> {
    let dimensions = config.validate()?;

    let mut layers = Vec::with_capacity(config.layers().len());
    for layer_config in config.layers() {
        let name = layer_config.path.display().to_string();
        let mesh = Mesh::from_stl_file(&layer_config.path)?;
        let material = MaterialId::try_from(layer_config.material)?;

        if mesh_ops::compute_mesh_signed_volume(&mesh) < 0.0 {
            tracing::warn!(
                layer = %name,
                "mesh has negative signed volume; faces may be wound inside out"
            );
        }
        tracing::info!(
            layer = %name,
            triangles = mesh.triangle_count(),
            material = material.get(),
            "loaded layer"
        );

        layers.push(Layer::new(name, mesh, material, layer_config.transform)?);
    }

    Scene::new(dimensions, layers)
}

/// Produces composited slices for a scene
///
/// Owns the classifier (and with it the render target), the compositor and
/// one reusable classification buffer per layer.
pub struct SliceRenderer<B: RenderBackend = CpuRasterizer> {
    classifier: SliceClassifier<B>,
    compositor: LayerCompositor,
    buffers: Vec<ClassificationBuffer>,
}

impl SliceRenderer<CpuRasterizer> {
    /// Renderer backed by the software rasterizer
    pub fn new(scene: &Scene) -> Result<Self> {
        Self::with_backend(CpuRasterizer::new(), scene)
    }
}

impl<B: RenderBackend> SliceRenderer<B> {
    /// Renderer on a caller-provided backend
    pub fn with_backend(backend: B, scene: &Scene) -> Result<Self> {
        let dimensions = scene.dimensions();
        let classifier = SliceClassifier::with_backend(backend, dimensions)?;
        let buffers = scene
            .layers()
            .iter()
            .map(|_| ClassificationBuffer::new(dimensions.x, dimensions.y))
            .collect();

        Ok(Self {
            classifier,
            compositor: LayerCompositor::new(dimensions.x, dimensions.y),
            buffers,
        })
    }

    /// Classify every layer at `depth` and composite the result
    pub fn render(&mut self, scene: &Scene, depth: usize) -> Result<Slice> {
        if self.buffers.len() != scene.layers().len() {
            return Err(Error::config(format!(
                "renderer was built for {} layers, scene has {}",
                self.buffers.len(),
                scene.layers().len()
            )));
        }

        for (layer, buffer) in scene.layers().iter().zip(self.buffers.iter_mut()) {
            self.classifier.classify(layer, depth, scene.max_z(), buffer)?;
        }
        self.compositor.composite(depth, &self.buffers)
    }
}

/// Runs one voxelization
///
/// A voxelizer can run once; afterwards it stays in [`DriverState::Done`] or
/// [`DriverState::Failed`] and further runs are rejected.
pub struct Voxelizer<B: RenderBackend = CpuRasterizer> {
    config: VoxelizerConfig,
    backend: Option<B>,
    state: DriverState,
}

impl Voxelizer<CpuRasterizer> {
    /// Voxelizer using the software rasterizer
    pub fn new(config: VoxelizerConfig) -> Self {
        Self::with_backend(config, CpuRasterizer::new())
    }
}

impl<B: RenderBackend> Voxelizer<B> {
    /// Voxelizer rendering on `backend`
    pub fn with_backend(config: VoxelizerConfig, backend: B) -> Self {
        Self {
            config,
            backend: Some(backend),
            state: DriverState::Configuring,
        }
    }

    /// Current state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Configuration this voxelizer runs
    pub fn config(&self) -> &VoxelizerConfig {
        &self.config
    }

    /// Write the volume to the configured output path
    pub fn run(&mut self) -> Result<VoxelizationReport> {
        self.run_with_progress(|_| {})
    }

    /// Like [`Voxelizer::run`], calling `progress` after every slice
    pub fn run_with_progress<F>(&mut self, progress: F) -> Result<VoxelizationReport>
    where
        F: FnMut(Progress),
    {
        let output_path = self.config.output_path().to_path_buf();
        self.execute(
            |dimensions| {
                tracing::info!(path = %output_path.display(), "writing volume");
                VolumeWriter::create(&output_path, dimensions)
            },
            progress,
        )
        .map(|(report, _)| report)
    }

    /// Write the volume to `sink` instead of the output path
    ///
    /// Returns the report and the sink once every slice is written.
    pub fn run_to_writer<W, F>(&mut self, sink: W, progress: F) -> Result<(VoxelizationReport, W)>
    where
        W: Write,
        F: FnMut(Progress),
    {
        self.execute(|dimensions| Ok(VolumeWriter::new(sink, dimensions)), progress)
    }

    fn execute<W, O, F>(&mut self, open: O, progress: F) -> Result<(VoxelizationReport, W)>
    where
        W: Write,
        O: FnOnce(Dimensions) -> Result<VolumeWriter<W>>,
        F: FnMut(Progress),
    {
        if self.state != DriverState::Configuring {
            return Err(Error::config(format!(
                "voxelizer already ran (state: {})",
                self.state
            )));
        }

        let result = self.drive(open, progress);
        match &result {
            Ok((report, _)) => {
                self.state = DriverState::Done;
                tracing::info!(
                    bytes = report.bytes_written,
                    filled = report.filled_voxels(),
                    "voxelization complete"
                );
            }
            Err(e) => {
                tracing::error!(state = %self.state, error = %e, "voxelization failed");
                self.state = DriverState::Failed;
            }
        }
        result
    }

    fn drive<W, O, F>(&mut self, open: O, mut progress: F) -> Result<(VoxelizationReport, W)>
    where
        W: Write,
        O: FnOnce(Dimensions) -> Result<VolumeWriter<W>>,
        F: FnMut(Progress),
    {
        self.config.validate()?;

        self.state = DriverState::Loading;
        let scene = load_scene(&self.config)?;
        let backend = self
            .backend
            .take()
            .ok_or_else(|| Error::config("voxelizer has no rendering backend"))?;
        // Released on drop, on every path out of this function
        let mut renderer = SliceRenderer::with_backend(backend, &scene)?;

        let dimensions = scene.dimensions();
        let mut writer = open(dimensions)?;
        let mut report = VoxelizationReport::new(&scene);
        tracing::info!(
            x = dimensions.x,
            y = dimensions.y,
            z = dimensions.z,
            layers = scene.layers().len(),
            triangles = scene.triangle_count(),
            "slicing scene"
        );

        for depth in 1..=dimensions.z {
            self.state = DriverState::Slicing { depth };
            let slice = renderer.render(&scene, depth)?;
            writer.write_slice(&slice)?;
            report.record(&slice);

            tracing::debug!(depth, total = dimensions.z, "slice written");
            progress(Progress {
                depth,
                total: dimensions.z,
            });
        }

        self.state = DriverState::Finalizing;
        report.bytes_written = writer.bytes_written();
        let sink = writer.finish()?;
        drop(renderer);

        Ok((report, sink))
    }
}

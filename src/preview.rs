//! Interactive slice inspection
//!
//! A [`PreviewSession`] renders single slices of a loaded scene on demand,
//! driven by a [`SliceCursor`] that input handlers move up and down. With the
//! `preview` feature a slice can be exported as a grayscale PNG.

#[cfg(feature = "preview")]
use std::path::Path;

use crate::driver::SliceRenderer;
use crate::error::{Error, Result};
use crate::model::{Scene, Slice};
use crate::raster::{CpuRasterizer, RenderBackend};

/// Current slice depth, kept within `1..=max_depth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceCursor {
    depth: usize,
    max_depth: usize,
}

impl SliceCursor {
    /// Cursor at depth 1 of a volume with `max_depth` slices
    ///
    /// A zero `max_depth` is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self {
            depth: 1,
            max_depth: max_depth.max(1),
        }
    }

    /// Current depth (1-based)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Deepest reachable slice
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Move by `delta` slices (positive = deeper), clamping at both ends
    ///
    /// Returns the new depth.
    pub fn scroll(&mut self, delta: i32) -> usize {
        let step = delta.unsigned_abs() as usize;
        self.depth = if delta >= 0 {
            self.depth.saturating_add(step)
        } else {
            self.depth.saturating_sub(step)
        }
        .clamp(1, self.max_depth);
        self.depth
    }

    /// Jump to `depth`, clamped into range
    pub fn seek(&mut self, depth: usize) -> usize {
        self.depth = depth.clamp(1, self.max_depth);
        self.depth
    }
}

/// A loaded scene with a render target, ready to show any slice
pub struct PreviewSession<B: RenderBackend = CpuRasterizer> {
    scene: Scene,
    renderer: SliceRenderer<B>,
    cursor: SliceCursor,
}

impl PreviewSession<CpuRasterizer> {
    /// Session backed by the software rasterizer
    pub fn new(scene: Scene) -> Result<Self> {
        Self::with_backend(scene, CpuRasterizer::new())
    }
}

impl<B: RenderBackend> PreviewSession<B> {
    /// Session rendering on `backend`
    pub fn with_backend(scene: Scene, backend: B) -> Result<Self> {
        let renderer = SliceRenderer::with_backend(backend, &scene)?;
        let cursor = SliceCursor::new(scene.dimensions().z);
        Ok(Self {
            scene,
            renderer,
            cursor,
        })
    }

    /// The scene being previewed
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The slice cursor
    pub fn cursor(&self) -> SliceCursor {
        self.cursor
    }

    /// Render the slice under the cursor
    pub fn current(&mut self) -> Result<Slice> {
        self.renderer.render(&self.scene, self.cursor.depth())
    }

    /// Move the cursor by `delta` and render the new slice
    pub fn scroll(&mut self, delta: i32) -> Result<Slice> {
        self.cursor.scroll(delta);
        self.current()
    }

    /// Render the slice at `depth`
    ///
    /// Unlike scrolling, an out-of-range depth is an error rather than being
    /// clamped.
    pub fn show(&mut self, depth: usize) -> Result<Slice> {
        if depth == 0 || depth > self.cursor.max_depth() {
            return Err(Error::config(format!(
                "preview slice {} is outside 1..={}",
                depth,
                self.cursor.max_depth()
            )));
        }
        self.cursor.seek(depth);
        self.current()
    }
}

/// Save a slice as an 8-bit grayscale PNG
///
/// Each pixel holds the material id. Rows are flipped so world +Y points up
/// in the image.
#[cfg(feature = "preview")]
pub fn save_png(slice: &Slice, path: impl AsRef<Path>) -> Result<()> {
    use image::{GrayImage, Luma};

    let width = u32::try_from(slice.width())
        .map_err(|_| Error::config("slice is too wide for a PNG"))?;
    let height = u32::try_from(slice.height())
        .map_err(|_| Error::config("slice is too tall for a PNG"))?;

    let image = GrayImage::from_fn(width, height, |x, y| {
        let row = slice.height() - 1 - y as usize;
        Luma([slice.get(x as usize, row).unwrap_or(0)])
    });

    image
        .save(path.as_ref())
        .map_err(|e| Error::Io(std::io::Error::other(e)))
}

//! Offscreen rasterization service
//!
//! Classification only needs one thing from a renderer: rasterize triangles
//! under an orthographic projection onto the XY plane, with depth testing and
//! without face culling, into a single-channel colour target, then read that
//! channel back as bytes. [`RenderBackend`] is that contract; a GPU backend
//! can implement it, and [`CpuRasterizer`] implements it in software.
//!
//! Projection conventions:
//! - Pixel `(x, y)` samples the world position `(x + 0.5, y + 0.5)`.
//! - The view looks along +Z. Fragments with `near <= z <= far` survive
//!   clipping; the depth test keeps the smallest `z`.
//! - The fragment stage writes the layer channel where the surface is seen
//!   from behind (world normal pointing to +Z, away from the viewer) and 0
//!   where it is seen from the front.

use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::model::{Dimensions, Triangle, decode_channel};

/// Orthographic projection for one slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoView {
    /// Target width in pixels
    pub width: usize,
    /// Target height in pixels
    pub height: usize,
    /// World Z of the near clipping plane
    pub near: f32,
    /// World Z of the far clipping plane
    pub far: f32,
}

impl OrthoView {
    /// View for a 1-based slice depth
    ///
    /// The near plane sits in the middle of voxel layer `depth`, at
    /// `z = depth - 0.5`. The far plane sits one unit past `max_z`, the
    /// largest Z of any layer in the scene, so solids are never clipped open
    /// at their far end.
    pub fn for_slice(dimensions: &Dimensions, depth: usize, max_z: f32) -> Self {
        Self {
            width: dimensions.x,
            height: dimensions.y,
            near: depth as f32 - 0.5,
            far: max_z + 1.0,
        }
    }
}

/// A rendering service with a single offscreen target
///
/// Methods take `&mut self`: one target can only serve one classification
/// at a time.
pub trait RenderBackend {
    /// Allocate (or reallocate) the colour and depth target
    fn allocate(&mut self, width: usize, height: usize) -> Result<()>;

    /// Clear colour to 0 and depth to the far limit
    fn clear(&mut self) -> Result<()>;

    /// Rasterize triangles, colouring back-facing hits with `channel`
    fn draw(&mut self, triangles: &[Triangle], view: &OrthoView, channel: f32) -> Result<()>;

    /// Read the colour channel back as bytes, row-major, row 0 first
    fn read_channel(&self, out: &mut [u8]) -> Result<()>;

    /// Free the target; further draws fail until the next `allocate`
    fn release(&mut self);
}

struct RenderTarget {
    width: usize,
    height: usize,
    color: Vec<f32>,
    depth: Vec<f32>,
}

/// Software implementation of [`RenderBackend`]
#[derive(Default)]
pub struct CpuRasterizer {
    target: Option<RenderTarget>,
}

impl CpuRasterizer {
    /// Create a rasterizer with no target allocated
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a target is currently allocated
    pub fn is_allocated(&self) -> bool {
        self.target.is_some()
    }

    fn target_mut(&mut self) -> Result<&mut RenderTarget> {
        self.target
            .as_mut()
            .ok_or_else(|| Error::backend("render target is not allocated"))
    }
}

impl RenderBackend for CpuRasterizer {
    fn allocate(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::backend(format!(
                "cannot allocate a {}x{} render target",
                width, height
            )));
        }
        let len = width
            .checked_mul(height)
            .ok_or_else(|| Error::backend(format!("render target {}x{} overflows", width, height)))?;

        let mut color = Vec::new();
        let mut depth = Vec::new();
        color
            .try_reserve_exact(len)
            .and_then(|_| depth.try_reserve_exact(len))
            .map_err(|e| {
                Error::backend(format!(
                    "failed to allocate {}x{} render target: {}",
                    width, height, e
                ))
            })?;
        color.resize(len, 0.0);
        depth.resize(len, f32::INFINITY);

        tracing::debug!(width, height, "allocated render target");
        self.target = Some(RenderTarget {
            width,
            height,
            color,
            depth,
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let target = self.target_mut()?;
        target.color.fill(0.0);
        target.depth.fill(f32::INFINITY);
        Ok(())
    }

    fn draw(&mut self, triangles: &[Triangle], view: &OrthoView, channel: f32) -> Result<()> {
        let target = self.target_mut()?;
        if view.width != target.width || view.height != target.height {
            return Err(Error::backend(format!(
                "view {}x{} does not match render target {}x{}",
                view.width, view.height, target.width, target.height
            )));
        }

        for triangle in triangles {
            if triangle.max_z() < view.near || triangle.min_z() > view.far {
                continue;
            }
            rasterize(target, triangle, view, shade(triangle, channel));
        }
        Ok(())
    }

    fn read_channel(&self, out: &mut [u8]) -> Result<()> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| Error::backend("render target is not allocated"))?;
        if out.len() != target.color.len() {
            return Err(Error::backend(format!(
                "readback buffer holds {} bytes, target has {} pixels",
                out.len(),
                target.color.len()
            )));
        }

        for (byte, &value) in out.iter_mut().zip(&target.color) {
            *byte = decode_channel(value);
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.target.take().is_some() {
            tracing::debug!("released render target");
        }
    }
}

/// Fragment colour for a triangle: the layer channel when the slice plane is
/// behind the surface, 0 otherwise
fn shade(triangle: &Triangle, channel: f32) -> f32 {
    if triangle.normal.z > 0.0 { channel } else { 0.0 }
}

/// Scan-convert one triangle into the target
///
/// Pixel centres on an edge count as covered.
fn rasterize(target: &mut RenderTarget, triangle: &Triangle, view: &OrthoView, color: f32) {
    let [a, b, c] = triangle.vertices;

    let area = edge(&a, &b, f64::from(c.x), f64::from(c.y));
    // Seen edge-on; covers no pixel centres
    if area == 0.0 {
        return;
    }

    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_y = a.y.max(b.y).max(c.y);

    let Some((x0, x1)) = pixel_span(min_x, max_x, target.width) else {
        return;
    };
    let Some((y0, y1)) = pixel_span(min_y, max_y, target.height) else {
        return;
    };

    for py in y0..=y1 {
        let sy = py as f64 + 0.5;
        let row = py * target.width;
        for px in x0..=x1 {
            let sx = px as f64 + 0.5;

            let w0 = edge(&b, &c, sx, sy) / area;
            let w1 = edge(&c, &a, sx, sy) / area;
            let w2 = edge(&a, &b, sx, sy) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let z = (w0 * f64::from(a.z) + w1 * f64::from(b.z) + w2 * f64::from(c.z)) as f32;
            if z < view.near || z > view.far {
                continue;
            }

            let index = row + px;
            if z < target.depth[index] {
                target.depth[index] = z;
                target.color[index] = color;
            }
        }
    }
}

/// Twice the signed area of triangle `(p, q, s)` where `s = (sx, sy)`
///
/// Always evaluated from the lexicographically smaller endpoint, so the two
/// triangles sharing an edge get exactly opposite values and a sample on
/// that edge is never rejected by both.
fn edge(p: &Point3<f32>, q: &Point3<f32>, sx: f64, sy: f64) -> f64 {
    let (from, to, sign) = if (p.x, p.y) <= (q.x, q.y) {
        (p, q, 1.0)
    } else {
        (q, p, -1.0)
    };
    let (fx, fy) = (f64::from(from.x), f64::from(from.y));
    let (tx, ty) = (f64::from(to.x), f64::from(to.y));
    sign * ((tx - fx) * (sy - fy) - (ty - fy) * (sx - fx))
}

/// Inclusive range of pixels whose centres fall within `[min, max]`
fn pixel_span(min: f32, max: f32, size: usize) -> Option<(usize, usize)> {
    let first = (min - 0.5).ceil().max(0.0);
    let last = (max - 0.5).floor().min(size as f32 - 1.0);
    if !(first <= last) {
        return None;
    }
    Some((first as usize, last as usize))
}

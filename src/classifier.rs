//! Per-layer slice classification
//!
//! Classifying a layer at a depth answers, for every cell of the slice,
//! "is the centre of this voxel inside the layer's solid?". The answer comes
//! from the nearest surface seen when looking from the slice plane towards
//! +Z: if that surface faces away from the plane, the plane is inside.

use crate::error::{Error, Result};
use crate::model::{Dimensions, EMPTY, Layer};
use crate::raster::{CpuRasterizer, OrthoView, RenderBackend};

/// X×Y buffer of 0 / material id produced for one layer at one depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationBuffer {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl ClassificationBuffer {
    /// Create an all-empty buffer
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    /// Wrap existing row-major cells
    ///
    /// Fails when `cells` does not hold exactly `width * height` values.
    pub fn from_cells(width: usize, height: usize, cells: Vec<u8>) -> Result<Self> {
        if Some(cells.len()) != width.checked_mul(height) {
            return Err(Error::backend(format!(
                "{} cells cannot form a {}x{} buffer",
                cells.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Cells along X
    pub fn width(&self) -> usize {
        self.width
    }

    /// Cells along Y
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell values
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Value of cell `(x, y)`, or `None` outside the buffer
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }
}

/// Classifies layers slice by slice on one render target
///
/// The target is allocated on construction and released when the classifier
/// is dropped, whichever way the run ends.
pub struct SliceClassifier<B: RenderBackend = CpuRasterizer> {
    backend: B,
    dimensions: Dimensions,
}

impl SliceClassifier<CpuRasterizer> {
    /// Classifier backed by the software rasterizer
    pub fn new(dimensions: Dimensions) -> Result<Self> {
        Self::with_backend(CpuRasterizer::new(), dimensions)
    }
}

impl<B: RenderBackend> SliceClassifier<B> {
    /// Allocate an X×Y target on `backend`
    pub fn with_backend(mut backend: B, dimensions: Dimensions) -> Result<Self> {
        backend.allocate(dimensions.x, dimensions.y)?;
        Ok(Self {
            backend,
            dimensions,
        })
    }

    /// Volume dimensions this classifier renders for
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Borrow the rendering backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Classify `layer` at 1-based `depth` into `out`
    ///
    /// `max_z` is the largest world Z of the whole scene and places the far
    /// clipping plane.
    pub fn classify(
        &mut self,
        layer: &Layer,
        depth: usize,
        max_z: f32,
        out: &mut ClassificationBuffer,
    ) -> Result<()> {
        if depth == 0 || depth > self.dimensions.z {
            return Err(Error::config(format!(
                "slice depth {} is outside 1..={}",
                depth, self.dimensions.z
            )));
        }
        if out.width != self.dimensions.x || out.height != self.dimensions.y {
            return Err(Error::backend(format!(
                "classification buffer is {}x{}, expected {}x{}",
                out.width, out.height, self.dimensions.x, self.dimensions.y
            )));
        }

        let view = OrthoView::for_slice(&self.dimensions, depth, max_z);
        self.backend.clear()?;
        self.backend
            .draw(layer.geometry(), &view, layer.material().encode())?;
        self.backend.read_channel(out.cells_mut())
    }
}

impl<B: RenderBackend> Drop for SliceClassifier<B> {
    fn drop(&mut self) {
        self.backend.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaterialId, Mesh, Transform};
    use nalgebra::Point3;

    /// Closed axis-aligned box with outward winding
    fn boxed(min: [f32; 3], max: [f32; 3]) -> Mesh {
        let p = |x: usize, y: usize, z: usize| {
            Point3::new(
                if x == 0 { min[0] } else { max[0] },
                if y == 0 { min[1] } else { max[1] },
                if z == 0 { min[2] } else { max[2] },
            )
        };
        let quads = [
            [p(0, 0, 0), p(0, 1, 0), p(1, 1, 0), p(1, 0, 0)],
            [p(0, 0, 1), p(1, 0, 1), p(1, 1, 1), p(0, 1, 1)],
            [p(0, 0, 0), p(1, 0, 0), p(1, 0, 1), p(0, 0, 1)],
            [p(0, 1, 0), p(0, 1, 1), p(1, 1, 1), p(1, 1, 0)],
            [p(0, 0, 0), p(0, 0, 1), p(0, 1, 1), p(0, 1, 0)],
            [p(1, 0, 0), p(1, 1, 0), p(1, 1, 1), p(1, 0, 1)],
        ];
        Mesh::from_triangles(
            quads
                .iter()
                .flat_map(|[a, b, c, d]| [[*a, *b, *c], [*a, *c, *d]]),
        )
    }

    fn layer(mesh: Mesh, id: u8) -> Layer {
        Layer::new("box", mesh, MaterialId::new(id).unwrap(), Transform::identity()).unwrap()
    }

    #[test]
    fn test_classify_inside_and_outside() {
        let dims = Dimensions::new(6, 6, 6).unwrap();
        let layer = layer(boxed([1.0, 1.0, 1.0], [4.0, 3.0, 4.0]), 9);
        let mut classifier = SliceClassifier::new(dims).unwrap();
        let mut buffer = ClassificationBuffer::new(6, 6);

        for depth in 1..=6 {
            classifier.classify(&layer, depth, 4.0, &mut buffer).unwrap();
            let inside = (2..=4).contains(&depth);
            for y in 0..6 {
                for x in 0..6 {
                    let covered = (1..4).contains(&x) && (1..3).contains(&y);
                    let expected = if inside && covered { 9 } else { 0 };
                    assert_eq!(buffer.get(x, y), Some(expected), "cell ({x}, {y}) at depth {depth}");
                }
            }
        }
    }

    #[test]
    fn test_buffer_is_overwritten_between_depths() {
        let dims = Dimensions::new(4, 4, 4).unwrap();
        let layer = layer(boxed([0.0, 0.0, 0.0], [4.0, 4.0, 2.0]), 3);
        let mut classifier = SliceClassifier::new(dims).unwrap();
        let mut buffer = ClassificationBuffer::new(4, 4);

        classifier.classify(&layer, 1, 2.0, &mut buffer).unwrap();
        assert!(buffer.as_bytes().iter().all(|&v| v == 3));
        classifier.classify(&layer, 4, 2.0, &mut buffer).unwrap();
        assert!(buffer.as_bytes().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_depth_out_of_range() {
        let dims = Dimensions::new(2, 2, 3).unwrap();
        let layer = layer(boxed([0.0; 3], [1.0; 3]), 1);
        let mut classifier = SliceClassifier::new(dims).unwrap();
        let mut buffer = ClassificationBuffer::new(2, 2);

        assert!(classifier.classify(&layer, 0, 1.0, &mut buffer).is_err());
        assert!(classifier.classify(&layer, 4, 1.0, &mut buffer).is_err());
    }

    #[test]
    fn test_mis_sized_buffer() {
        let dims = Dimensions::new(2, 2, 3).unwrap();
        let layer = layer(boxed([0.0; 3], [1.0; 3]), 1);
        let mut classifier = SliceClassifier::new(dims).unwrap();
        let mut buffer = ClassificationBuffer::new(3, 2);

        let err = classifier.classify(&layer, 1, 1.0, &mut buffer).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_far_plane_follows_scene_extent() {
        // The box is taller than the volume; with the far plane at Z the top
        // face would be clipped and the cells read as empty.
        let dims = Dimensions::new(2, 2, 2).unwrap();
        let layer = layer(boxed([0.0; 3], [2.0, 2.0, 10.0]), 4);
        let mut classifier = SliceClassifier::new(dims).unwrap();
        let mut buffer = ClassificationBuffer::new(2, 2);

        classifier.classify(&layer, 2, 10.0, &mut buffer).unwrap();
        assert_eq!(buffer.as_bytes(), &[4, 4, 4, 4]);
    }
}

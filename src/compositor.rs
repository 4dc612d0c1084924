//! Merging per-layer classifications into one slice

use crate::classifier::ClassificationBuffer;
use crate::error::{Error, Result};
use crate::model::{EMPTY, Slice};

/// Combines the classification buffers of one depth
///
/// Buffers are applied in configured layer order and a nonzero cell
/// overwrites whatever an earlier layer put there, so the last layer that
/// claims a cell owns it. Geometric depth plays no part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerCompositor {
    width: usize,
    height: usize,
}

impl LayerCompositor {
    /// Compositor for `width` × `height` slices
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Composite `buffers` (in layer order) into the slice at `depth`
    pub fn composite(&self, depth: usize, buffers: &[ClassificationBuffer]) -> Result<Slice> {
        let mut slice = Slice::new(self.width, self.height, depth);
        let cells = slice.cells_mut();

        for (index, buffer) in buffers.iter().enumerate() {
            if buffer.as_bytes().len() != cells.len() {
                return Err(Error::backend(format!(
                    "classification buffer for layer {} holds {} cells, slice has {}",
                    index,
                    buffer.as_bytes().len(),
                    cells.len()
                )));
            }

            for (cell, &value) in cells.iter_mut().zip(buffer.as_bytes()) {
                if value != EMPTY {
                    *cell = value;
                }
            }
        }

        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: usize, height: usize, cells: &[u8]) -> ClassificationBuffer {
        ClassificationBuffer::from_cells(width, height, cells.to_vec()).unwrap()
    }

    #[test]
    fn test_last_nonzero_layer_wins() {
        let compositor = LayerCompositor::new(4, 1);
        let slice = compositor
            .composite(
                3,
                &[
                    buffer(4, 1, &[3, 3, 0, 0]),
                    buffer(4, 1, &[0, 7, 7, 0]),
                ],
            )
            .unwrap();

        assert_eq!(slice.depth(), 3);
        assert_eq!(slice.as_bytes(), &[3, 7, 7, 0]);
    }

    #[test]
    fn test_order_decides_not_value() {
        let compositor = LayerCompositor::new(1, 1);
        let slice = compositor
            .composite(1, &[buffer(1, 1, &[200]), buffer(1, 1, &[2])])
            .unwrap();
        assert_eq!(slice.as_bytes(), &[2]);

        let slice = compositor
            .composite(1, &[buffer(1, 1, &[2]), buffer(1, 1, &[200])])
            .unwrap();
        assert_eq!(slice.as_bytes(), &[200]);
    }

    #[test]
    fn test_no_layers_gives_empty_slice() {
        let slice = LayerCompositor::new(3, 2).composite(1, &[]).unwrap();
        assert!(slice.is_empty());
        assert_eq!(slice.as_bytes().len(), 6);
    }

    #[test]
    fn test_mis_sized_buffer_rejected() {
        let compositor = LayerCompositor::new(2, 2);
        let err = compositor
            .composite(1, &[buffer(2, 1, &[1, 1])])
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}

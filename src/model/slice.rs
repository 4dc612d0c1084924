//! Voxel slices

use super::material::EMPTY;

/// One depth level of the voxel volume
///
/// Cells are stored row-major: the material of cell `(x, y)` is at
/// `y * width + x`. Row 0 is the row nearest the world Y origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    depth: usize,
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Slice {
    /// Create an empty slice for a 1-based depth
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            depth,
            width,
            height,
            cells: vec![EMPTY; width * height],
        }
    }

    /// 1-based depth of this slice in the volume
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of cells along X
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells along Y
    pub fn height(&self) -> usize {
        self.height
    }

    /// Material of cell `(x, y)`, or `None` outside the slice
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    /// Raw row-major bytes, exactly as written to the volume
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Whether every cell is empty
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&cell| cell == EMPTY)
    }

    /// Number of cells holding `material`
    pub fn count(&self, material: u8) -> usize {
        self.cells.iter().filter(|&&cell| cell == material).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slice_is_empty() {
        let slice = Slice::new(4, 3, 1);
        assert_eq!(slice.as_bytes().len(), 12);
        assert!(slice.is_empty());
        assert_eq!(slice.count(EMPTY), 12);
    }

    #[test]
    fn test_row_major_layout() {
        let mut slice = Slice::new(4, 3, 2);
        slice.cells_mut()[2 * 4 + 1] = 7;

        assert_eq!(slice.get(1, 2), Some(7));
        assert_eq!(slice.get(2, 1), Some(EMPTY));
        assert_eq!(slice.get(4, 0), None);
        assert_eq!(slice.get(0, 3), None);
        assert_eq!(slice.count(7), 1);
        assert!(!slice.is_empty());
    }
}

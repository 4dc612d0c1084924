//! Raw voxel volume output
//!
//! The volume format has no header, no footer and no padding: `Z` slices of
//! `X * Y` bytes each, concatenated in ascending depth order. The byte at
//! offset `(d - 1) * X * Y + y * X + x` is the material of cell `(x, y)` at
//! depth `d`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Dimensions, Slice};

/// Streams slices to a byte sink in depth order
///
/// Dropping a writer without calling [`VolumeWriter::finish`] leaves a
/// short volume behind, which consumers must treat as incomplete.
pub struct VolumeWriter<W: Write> {
    sink: W,
    dimensions: Dimensions,
    slices_written: usize,
    bytes_written: u64,
}

impl VolumeWriter<BufWriter<File>> {
    /// Create (or truncate) the output file at `path`
    pub fn create(path: impl AsRef<Path>, dimensions: Dimensions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("cannot create {}: {}", path.display(), e),
            ))
        })?;
        Ok(Self::new(BufWriter::new(file), dimensions))
    }
}

impl<W: Write> VolumeWriter<W> {
    /// Wrap an already-open sink
    pub fn new(sink: W, dimensions: Dimensions) -> Self {
        Self {
            sink,
            dimensions,
            slices_written: 0,
            bytes_written: 0,
        }
    }

    /// Append the next slice
    ///
    /// Slices must arrive in order `1, 2, ..., Z` and hold exactly `X * Y`
    /// cells.
    pub fn write_slice(&mut self, slice: &Slice) -> Result<()> {
        let expected_depth = self.slices_written + 1;
        if slice.depth() != expected_depth || expected_depth > self.dimensions.z {
            return Err(invalid_input(format!(
                "expected slice {} of {}, got slice {}",
                expected_depth,
                self.dimensions.z,
                slice.depth()
            )));
        }
        if slice.width() != self.dimensions.x || slice.height() != self.dimensions.y {
            return Err(invalid_input(format!(
                "slice {} is {}x{}, volume slices are {}x{}",
                slice.depth(),
                slice.width(),
                slice.height(),
                self.dimensions.x,
                self.dimensions.y
            )));
        }

        let bytes = slice.as_bytes();
        self.sink.write_all(bytes)?;
        self.slices_written += 1;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Number of slices written so far
    pub fn slices_written(&self) -> usize {
        self.slices_written
    }

    /// Number of bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush the sink and check the volume is complete
    ///
    /// Returns the sink so callers writing to memory can take the bytes.
    pub fn finish(mut self) -> Result<W> {
        self.sink.flush()?;
        if self.slices_written != self.dimensions.z {
            return Err(Error::IncompleteVolume {
                written: self.slices_written,
                expected: self.dimensions.z,
            });
        }
        Ok(self.sink)
    }
}

fn invalid_input(message: String) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidInput, message))
}

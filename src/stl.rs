//! Binary STL reading and writing
//!
//! Binary STL layout (all values little-endian):
//!
//! ```text
//! u8[80]    header                  80 bytes
//! u32       triangle count           4 bytes
//! per triangle                      50 bytes
//!     f32[3]    normal              12 bytes (ignored, recomputed)
//!     f32[3]    vertex 1            12 bytes
//!     f32[3]    vertex 2            12 bytes
//!     f32[3]    vertex 3            12 bytes
//!     u16       attribute count      2 bytes (ignored)
//! ```
//!
//! The stored normal is never trusted: exporters frequently write zero or
//! left-handed normals. Every face normal is recomputed from the winding.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{Error, ErrorContext, Result};
use crate::model::{Mesh, Triangle};

/// Length of the free-form header
pub const HEADER_LEN: usize = 80;

/// Length of one triangle record
pub const RECORD_LEN: usize = 50;

/// Triangles reserved up front, regardless of the declared count
///
/// The declared count comes from an untrusted file; larger meshes simply
/// grow the buffers as records arrive.
const MAX_PREALLOCATED_TRIANGLES: usize = 1 << 16;

/// Read a binary STL mesh from a reader
///
/// Fails with [`Error::Parse`] when the header, the triangle count or any
/// of the declared triangle records is cut short. No partial mesh is ever
/// returned.
///
/// # Example
///
/// ```no_run
/// use std::fs::File;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mesh = stl2vox::stl::read_stl(File::open("part.stl")?)?;
/// println!("{} triangles", mesh.triangle_count());
/// # Ok(())
/// # }
/// ```
pub fn read_stl<R: Read>(reader: R) -> Result<Mesh> {
    let mut reader = BufReader::new(reader);

    let mut header = [0u8; HEADER_LEN];
    read_or_eof(&mut reader, &mut header).map_err(|e| {
        e.unwrap_or_else(|| {
            Error::parse(
                "file is shorter than the 80-byte STL header",
                ErrorContext::new().offset(0),
            )
        })
    })?;
    let looks_ascii = header.starts_with(b"solid");

    let mut count = [0u8; 4];
    read_or_eof(&mut reader, &mut count).map_err(|e| {
        e.unwrap_or_else(|| {
            Error::parse(
                "file ends before the triangle count",
                ErrorContext::new().offset(HEADER_LEN as u64),
            )
        })
    })?;
    let declared = u32::from_le_bytes(count);

    let mut mesh = Mesh::with_capacity((declared as usize).min(MAX_PREALLOCATED_TRIANGLES));
    let mut record = [0u8; RECORD_LEN];

    for index in 0..declared {
        read_or_eof(&mut reader, &mut record).map_err(|e| {
            e.unwrap_or_else(|| {
                let offset = (HEADER_LEN + 4) as u64 + u64::from(index) * RECORD_LEN as u64;
                let err = Error::truncated_record(index, declared, offset);
                if looks_ascii {
                    annotate_ascii(err)
                } else {
                    err
                }
            })
        })?;

        let [v1, v2, v3] = [12, 24, 36].map(|start| read_point(&record[start..start + 12]));
        mesh.push_triangle(v1, v2, v3);
    }

    Ok(mesh)
}

/// Load a binary STL mesh from a file
///
/// A file that cannot be opened is reported as a parse failure for that
/// mesh, with the path attached.
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::parse(
            format!("cannot open mesh file: {}", e),
            ErrorContext::new()
                .file(path.display().to_string())
                .hint("Check the path and read permissions"),
        )
    })?;

    read_stl(file).map_err(|e| e.in_file(path.display().to_string()))
}

/// Write triangles as a binary STL
///
/// The header is zero-filled and every normal is recomputed from the
/// winding.
pub fn write_stl<'a, W, I>(writer: W, triangles: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Triangle>,
    I::IntoIter: ExactSizeIterator,
{
    let triangles = triangles.into_iter();
    let count = u32::try_from(triangles.len())
        .map_err(|_| Error::config("binary STL cannot hold more than u32::MAX triangles"))?;

    let mut writer = BufWriter::new(writer);
    writer.write_all(&[0u8; HEADER_LEN])?;
    writer.write_all(&count.to_le_bytes())?;

    for triangle in triangles {
        let [v1, v2, v3] = triangle.vertices;
        let normal = crate::mesh_ops::face_normal(&v1, &v2, &v3);
        for value in [normal.x, normal.y, normal.z] {
            writer.write_all(&value.to_le_bytes())?;
        }
        for vertex in [v1, v2, v3] {
            for value in [vertex.x, vertex.y, vertex.z] {
                writer.write_all(&value.to_le_bytes())?;
            }
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

impl Mesh {
    /// Load a binary STL mesh from a file
    ///
    /// Shorthand for [`load_stl`].
    pub fn from_stl_file(path: impl AsRef<Path>) -> Result<Self> {
        load_stl(path)
    }
}

/// Fill `buf` completely. End of file maps to `Err(None)`, any other I/O
/// failure to `Err(Some(Error::Io))`.
fn read_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::result::Result<(), Option<Error>> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => None,
        _ => Some(Error::Io(e)),
    })
}

fn read_point(bytes: &[u8]) -> Point3<f32> {
    let coord = |i: usize| {
        f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
    };
    Point3::new(coord(0), coord(4), coord(8))
}

fn annotate_ascii(err: Error) -> Error {
    match err {
        Error::Parse { message, context } => Error::Parse {
            message,
            context: context.hint(
                "The header starts with \"solid\"; this may be an ASCII STL, which is not supported",
            ),
        },
        other => other,
    }
}

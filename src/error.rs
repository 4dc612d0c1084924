//! Error types for voxelization runs
//!
//! Every failure in a run is fatal: nothing is retried or downgraded. All
//! errors carry a code so callers and log readers can categorize them.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and output volume errors
//! - **E2xxx**: Mesh parsing errors
//! - **E3xxx**: Configuration errors
//! - **E4xxx**: Rendering backend errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading a mesh or writing the volume
//! - `E1002`: Output volume finished with fewer slices than configured
//! - `E2001`: Malformed or truncated STL file
//! - `E3001`: Invalid dimensions, layers, material ids or scene file
//! - `E4001`: Offscreen target allocation or readback failure

use std::io;
use thiserror::Error;

/// Result type for voxelization operations
pub type Result<T> = std::result::Result<T, Error>;

/// Additional context for mesh parsing errors
///
/// Provides optional supplementary information to help with debugging:
/// - The mesh file being read
/// - The triangle record and byte offset where reading stopped
/// - A hint for resolving common issues
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// The mesh file where the error occurred
    pub file: Option<String>,

    /// Zero-based index of the triangle record being read
    pub triangle: Option<u32>,

    /// Byte offset into the file where the failed read started
    pub offset: Option<u64>,

    /// A helpful hint for resolving the error
    pub hint: Option<String>,
}

impl ErrorContext {
    /// Create a new empty error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file location
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the triangle record index
    pub fn triangle(mut self, triangle: u32) -> Self {
        self.triangle = Some(triangle);
        self
    }

    /// Set the byte offset
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the hint
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if let Some(ref file) = self.file {
            parts.push(format!("File: {}", file));
        }

        match (self.triangle, self.offset) {
            (Some(triangle), Some(offset)) => {
                parts.push(format!("Location: triangle {}, byte {}", triangle, offset))
            }
            (Some(triangle), None) => parts.push(format!("Triangle: {}", triangle)),
            (None, Some(offset)) => parts.push(format!("Byte: {}", offset)),
            (None, None) => {}
        }

        if let Some(ref hint) = self.hint {
            parts.push(format!("Hint: {}", hint));
        }

        if !parts.is_empty() {
            write!(f, "\n{}", parts.join("\n"))
        } else {
            Ok(())
        }
    }
}

/// Errors that can occur while voxelizing a scene
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading a mesh or writing the volume
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - Output disk full
    /// - Insufficient permissions
    /// - Output stream closed
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// The output volume was finished before every slice was written
    ///
    /// **Error Code**: E1002
    ///
    /// A volume shorter than `X * Y * Z` bytes must be treated as incomplete
    /// by downstream tools.
    #[error("[E1002] Incomplete volume: wrote {written} of {expected} slices")]
    IncompleteVolume {
        /// Slices actually written
        written: usize,
        /// Slices the volume was configured with
        expected: usize,
    },

    /// Malformed or truncated STL file
    ///
    /// **Error Code**: E2001
    ///
    /// **Common Causes**:
    /// - File ends before the declared number of triangles
    /// - ASCII STL passed where binary STL is expected
    /// - Header or triangle count truncated
    ///
    /// **Suggestions**:
    /// - Re-export the mesh as binary STL
    /// - Check that the file was copied completely
    #[error("[E2001] STL parse error: {message}{context}")]
    Parse {
        /// Description of the error
        message: String,
        /// Where in the file the error occurred
        context: ErrorContext,
    },

    /// Invalid run configuration
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Zero or missing volume dimension
    /// - No layers specified
    /// - Material id outside 1..=255
    /// - Singular layer transform (zero scale)
    /// - Unreadable or malformed scene file
    #[error("[E3001] Invalid configuration: {0}")]
    Config(String),

    /// Rendering backend failure
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Offscreen target too large to allocate
    /// - Classification requested before the target was allocated
    /// - Readback buffer of the wrong size
    #[error("[E4001] Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Error::Backend(message.into())
    }

    /// Create a Parse error with context
    pub fn parse(message: impl Into<String>, context: ErrorContext) -> Self {
        Error::Parse {
            message: message.into(),
            context,
        }
    }

    /// Create a Parse error for a triangle record cut short by end of file
    ///
    /// # Arguments
    /// * `triangle` - Zero-based index of the incomplete record
    /// * `declared` - Triangle count declared in the file
    /// * `offset` - Byte offset where the record starts
    pub fn truncated_record(triangle: u32, declared: u32, offset: u64) -> Self {
        Error::parse(
            format!(
                "file ends inside triangle record {} of {} declared",
                triangle, declared
            ),
            ErrorContext::new()
                .triangle(triangle)
                .offset(offset)
                .hint("The file is truncated or the triangle count in the header is wrong"),
        )
    }

    /// Attach a file name to a Parse error, leaving other errors untouched
    pub fn in_file(self, file: impl Into<String>) -> Self {
        match self {
            Error::Parse { message, context } => Error::Parse {
                message,
                context: context.file(file),
            },
            other => other,
        }
    }
}

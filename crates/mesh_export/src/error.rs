//! Error taxonomy for the export pipeline
//!
//! Each pipeline stage owns one error type. [`ExportError`] wraps them at the
//! top level and remembers which [`Stage`] failed.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The mesh resource could not be opened or parsed
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The mesh file could not be opened
    #[error("Cannot open mesh {}: {source}", .path.display())]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Read failure while the file was already open
    #[error("I/O error while reading mesh: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed content at a given line
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number (0 when unknown)
        line: usize,
        /// What went wrong
        message: String,
    },

    /// MSH version other than 2.x or 4.1
    #[error("Unsupported MSH version: {0}")]
    UnsupportedVersion(String),

    /// Binary MSH payloads are not read
    #[error("Binary MSH files are not supported, re-export the mesh as ASCII")]
    BinaryUnsupported,

    /// A required section is absent
    #[error("Missing section: ${0}")]
    MissingSection(String),

    /// Another session is still alive on this thread
    #[error("A mesh session is already active")]
    SessionBusy,

    /// Data was requested before a mesh was opened
    #[error("No mesh has been opened in this session")]
    NoModel,
}

/// Raw arrays violate the shape the reshaper expects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedDataError {
    /// Coordinate array is not made of whole triples
    #[error("Coordinate array length {len} is not a multiple of 3")]
    CoordinateCount {
        /// Length of the flat coordinate array
        len: usize,
    },

    /// A selected element block is not made of whole elements
    #[error("Element block of type {element_type} has {len} node references, not a multiple of {nodes_per_element}")]
    BlockLength {
        /// Element type tag of the block
        element_type: i32,
        /// Length of the flat reference array
        len: usize,
        /// Expected references per element
        nodes_per_element: usize,
    },

    /// Node reference 0 has no 0-based counterpart
    #[error("Element {element} references node 0, node references are 1-based")]
    ZeroReference {
        /// Position of the element in the tetrahedron output
        element: usize,
    },

    /// Node tag not present in the node table
    #[error("Element {element} references unknown node tag {tag}")]
    UnknownNodeTag {
        /// Position of the element in the tetrahedron output
        element: usize,
        /// Offending node tag
        tag: usize,
    },

    /// Resolved index past the end of the node array
    #[error("Element {element} references node index {index}, but only {node_count} nodes exist")]
    IndexOutOfRange {
        /// Position of the element in the tetrahedron output
        element: usize,
        /// Resolved 0-based index
        index: usize,
        /// Number of nodes in the document
        node_count: usize,
    },

    /// Index does not fit a 32-bit index buffer
    #[error("Node index {index} does not fit in a 32-bit index buffer")]
    IndexOverflow {
        /// Offending index
        index: usize,
    },
}

/// The output document could not be written
#[derive(Error, Debug)]
#[error("Cannot write {}: {source}", .path.display())]
pub struct IoError {
    /// Destination path
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    /// Attach a destination path to an I/O error
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Pipeline stage, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the mesh through the provider
    Load,
    /// Building nodes and tetrahedra from raw arrays
    Reshape,
    /// Writing the JSON document
    Serialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Reshape => "reshape",
            Self::Serialize => "serialize",
        };
        f.write_str(name)
    }
}

/// Top-level export failure
#[derive(Error, Debug)]
pub enum ExportError {
    /// Load stage failed
    #[error("load stage failed: {0}")]
    Resource(#[from] ResourceError),

    /// Reshape stage failed
    #[error("reshape stage failed: {0}")]
    Malformed(#[from] MalformedDataError),

    /// Serialize stage failed
    #[error("serialize stage failed: {0}")]
    Io(#[from] IoError),
}

impl ExportError {
    /// Stage at which the run aborted
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Resource(_) => Stage::Load,
            Self::Malformed(_) => Stage::Reshape,
            Self::Io(_) => Stage::Serialize,
        }
    }
}

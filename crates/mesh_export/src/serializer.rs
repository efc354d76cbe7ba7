//! JSON serialization of [`MeshDocument`]
//!
//! The document is rendered in memory first and then written to a sibling
//! temporary file that is renamed over the destination. A failed write leaves
//! the destination untouched.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::ser::Error as _;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::document::MeshDocument;
use crate::error::IoError;

/// Indent width used when none is configured
pub const DEFAULT_INDENT: usize = 2;

/// Widest indent accepted
pub const MAX_INDENT: usize = 16;

/// Render a document as JSON text; `indent == 0` gives a single line
///
/// Fails on an indent wider than [`MAX_INDENT`] and on non-finite
/// coordinates, which JSON cannot represent.
pub fn to_json_bytes(document: &MeshDocument, indent: usize) -> serde_json::Result<Vec<u8>> {
    if indent > MAX_INDENT {
        return Err(serde_json::Error::custom(format!(
            "indent {indent} is wider than {MAX_INDENT}"
        )));
    }
    if let Some(position) = document.nodes.iter().position(|node| !node.is_finite()) {
        return Err(serde_json::Error::custom(format!(
            "node {position} has a non-finite coordinate"
        )));
    }

    if indent == 0 {
        return serde_json::to_vec(document);
    }

    let indent = " ".repeat(indent);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    document.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Write a document to `path`, replacing any existing file
///
/// Returns the number of bytes written.
pub fn write_document(
    document: &MeshDocument,
    path: impl AsRef<Path>,
    indent: usize,
) -> Result<usize, IoError> {
    let path = path.as_ref();
    let bytes = to_json_bytes(document, indent).map_err(|e| IoError::new(path, e.into()))?;

    let staging = staging_path(path).ok_or_else(|| {
        IoError::new(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"),
        )
    })?;

    let written = fs::write(&staging, &bytes).and_then(|()| fs::rename(&staging, path));
    if let Err(source) = written {
        // The staging file may or may not exist at this point
        let _ = fs::remove_file(&staging);
        return Err(IoError::new(path, source));
    }

    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(bytes.len())
}

fn staging_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let mut staging = OsString::from(".");
    staging.push(name);
    staging.push(".partial");
    Some(path.with_file_name(staging))
}

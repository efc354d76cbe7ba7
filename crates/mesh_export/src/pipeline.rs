//! Export pipeline: load, reshape, serialize
//!
//! Every stage either succeeds or aborts the run. The provider session is
//! closed before the document is written, and nothing is written unless the
//! first two stages succeed.

use std::path::PathBuf;

use crate::config::ExportConfig;
use crate::document::MeshSummary;
use crate::error::ExportError;
use crate::loader::{GmshSource, MeshSource};
use crate::reshape::reshape;
use crate::serializer::write_document;

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Counts and bounds of the written document
    pub summary: MeshSummary,
    /// Where the document went
    pub output: PathBuf,
    /// Size of the written file
    pub bytes_written: usize,
}

/// Run an export with an explicit mesh source
pub fn export_with<S: MeshSource + ?Sized>(
    source: &S,
    config: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    log::info!("Loading mesh {}", config.input.display());
    let raw = source.load(&config.input)?;
    log::info!(
        "Loaded {} coordinates and {} element blocks",
        raw.coords.len(),
        raw.blocks.len()
    );

    log::info!("Reshaping geometry ({} index mode)", config.index_mode);
    let document = reshape(&raw, config.reshape_options())?;
    drop(raw);
    let summary = document.summary();
    log::info!("Built document: {summary}");

    log::info!("Writing {}", config.output.display());
    let bytes_written = write_document(&document, &config.output, config.indent)?;

    Ok(ExportReport {
        summary,
        output: config.output.clone(),
        bytes_written,
    })
}

/// Run an export reading MSH files from disk
pub fn export(config: &ExportConfig) -> Result<ExportReport, ExportError> {
    export_with(&GmshSource, config)
}

//! # Mesh Export
//!
//! Extracts tetrahedral geometry from Gmsh meshes and writes it as JSON.
//!
//! ## Pipeline
//!
//! - **Load**: a [`MeshSource`] produces flat coordinates and typed element
//!   blocks. [`GmshSource`] reads MSH 2.2 / 4.1 ASCII files inside a scoped
//!   [`msh::Session`].
//! - **Reshape**: coordinates become [`Node`] triples, 4-node tetrahedron
//!   blocks become 0-based [`Tetrahedron`] tuples, every other block is
//!   dropped.
//! - **Serialize**: the [`MeshDocument`] is written as indented JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mesh_export::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExportConfig::new("heart.msh", "heart.json");
//!     let report = mesh_export::export(&config)?;
//!     println!("{}", report.summary);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod document;
pub mod error;
pub mod foundation;
pub mod loader;
pub mod msh;
pub mod pipeline;
pub mod reshape;
pub mod serializer;

pub use config::{Config, ConfigError, ExportConfig};
pub use document::{MeshDocument, MeshSummary, Node, Tetrahedron};
pub use error::{ExportError, IoError, MalformedDataError, ResourceError, Stage};
pub use loader::{GmshSource, MeshSource, RawMesh};
pub use pipeline::{export, export_with, ExportReport};
pub use reshape::{IndexMode, ReshapeOptions};

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ExportConfig},
        document::{MeshDocument, Node, Tetrahedron},
        error::{ExportError, Stage},
        loader::{GmshSource, MeshSource, RawMesh},
        msh::{ElementBlock, ElementType},
        reshape::IndexMode,
    };
}

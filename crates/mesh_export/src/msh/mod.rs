//! Gmsh MSH provider
//!
//! Element type codes, the ASCII reader and the scoped [`Session`] that
//! hands out raw node and element arrays.

pub mod element;
pub mod parser;
pub mod session;

#[cfg(test)]
pub(crate) mod fixtures;

pub use element::{ElementBlock, ElementType};
pub use parser::{parse_msh, MshModel, MshVersion};
pub use session::Session;

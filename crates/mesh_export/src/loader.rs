//! Mesh loading
//!
//! [`MeshSource`] is the seam between the pipeline and whatever reads the
//! mesh. [`GmshSource`] is the stock implementation on top of [`Session`].

use std::path::Path;

use crate::error::ResourceError;
use crate::msh::{ElementBlock, Session};

/// Raw provider output, before any reshaping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMesh {
    /// Node tags, aligned with the coordinate triples
    pub node_tags: Vec<usize>,
    /// Flat `x y z` coordinates
    pub coords: Vec<f64>,
    /// Element blocks tagged by element type
    pub blocks: Vec<ElementBlock>,
}

impl RawMesh {
    /// Build a raw mesh whose node tags are `1..=n`
    pub fn with_sequential_tags(coords: Vec<f64>, blocks: Vec<ElementBlock>) -> Self {
        let node_tags = (1..=coords.len() / 3).collect();
        Self {
            node_tags,
            coords,
            blocks,
        }
    }
}

/// Anything that can turn a mesh path into raw arrays
pub trait MeshSource {
    /// Load the mesh at `path`
    fn load(&self, path: &Path) -> Result<RawMesh, ResourceError>;
}

/// Loads MSH files through a scoped [`Session`]
#[derive(Debug, Default, Clone, Copy)]
pub struct GmshSource;

impl MeshSource for GmshSource {
    fn load(&self, path: &Path) -> Result<RawMesh, ResourceError> {
        let mut session = Session::initialize()?;
        session.open(path)?;
        let (node_tags, coords) = session.nodes()?;
        let blocks = session.elements()?;
        session.finalize();

        Ok(RawMesh {
            node_tags,
            coords,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msh::fixtures;
    use std::io::Write;

    #[test]
    fn test_gmsh_source_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", fixtures::TET_WITH_TRIANGLE_V41).unwrap();

        let raw = GmshSource.load(file.path()).unwrap();
        assert_eq!(raw.node_tags, vec![1, 2, 3, 4]);
        assert_eq!(raw.coords.len(), 12);
        assert_eq!(raw.blocks.len(), 2);
        assert!(!Session::is_active());
    }

    #[test]
    fn test_gmsh_source_releases_session_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n2\n").unwrap();

        assert!(GmshSource.load(file.path()).is_err());
        assert!(!Session::is_active());
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let result = GmshSource.load(Path::new("no/such/mesh.msh"));
        assert!(matches!(result, Err(ResourceError::Open { .. })));
    }

    #[test]
    fn test_sequential_tags() {
        let raw = RawMesh::with_sequential_tags(vec![0.0; 9], Vec::new());
        assert_eq!(raw.node_tags, vec![1, 2, 3]);
    }
}

//! Scoped mesh session
//!
//! A [`Session`] stands for the mesh library's processing context. Only one
//! session may be alive per thread; it is released when dropped, so a failed
//! `open` still frees the context. Sessions are bound to the thread that
//! created them.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;

use super::element::ElementBlock;
use super::parser::{parse_msh, MshModel};
use crate::error::ResourceError;

thread_local! {
    static SESSION_ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// Exclusive handle on the mesh processing context
#[derive(Debug)]
pub struct Session {
    model: Option<MshModel>,
    // Keeps the handle on the thread that owns the context
    _not_send: PhantomData<*const ()>,
}

impl Session {
    /// Acquire the context for this thread
    pub fn initialize() -> Result<Self, ResourceError> {
        if SESSION_ACTIVE.with(|active| active.replace(true)) {
            return Err(ResourceError::SessionBusy);
        }
        log::debug!("Mesh session acquired");
        Ok(Self {
            model: None,
            _not_send: PhantomData,
        })
    }

    /// Whether a session is alive on the current thread
    pub fn is_active() -> bool {
        SESSION_ACTIVE.with(Cell::get)
    }

    /// Load a mesh file into the session, replacing any previous model
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), ResourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Opening mesh {}", path.display());
        self.open_reader(BufReader::new(file))
    }

    /// Load a mesh from any buffered reader
    pub fn open_reader<R: BufRead>(&mut self, reader: R) -> Result<(), ResourceError> {
        let model = parse_msh(reader)?;
        log::debug!(
            "Parsed {:?} mesh: {} nodes, {} element blocks",
            model.version,
            model.node_count(),
            model.blocks.len()
        );
        self.model = Some(model);
        Ok(())
    }

    /// Node tags and flat coordinates of the open mesh
    pub fn nodes(&self) -> Result<(Vec<usize>, Vec<f64>), ResourceError> {
        let model = self.model()?;
        Ok((model.node_tags.clone(), model.coords.clone()))
    }

    /// Element blocks of the open mesh, one per element type
    pub fn elements(&self) -> Result<Vec<ElementBlock>, ResourceError> {
        Ok(self.model()?.blocks.clone())
    }

    /// Release the context now instead of at end of scope
    pub fn finalize(self) {
        drop(self);
    }

    fn model(&self) -> Result<&MshModel, ResourceError> {
        self.model.as_ref().ok_or(ResourceError::NoModel)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        SESSION_ACTIVE.with(|active| active.set(false));
        log::debug!("Mesh session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msh::fixtures;

    #[test]
    fn test_second_session_is_refused() {
        let session = Session::initialize().unwrap();
        assert!(Session::is_active());
        assert!(matches!(
            Session::initialize(),
            Err(ResourceError::SessionBusy)
        ));

        session.finalize();
        assert!(!Session::is_active());

        let again = Session::initialize().unwrap();
        drop(again);
    }

    #[test]
    fn test_session_released_after_failed_open() {
        {
            let mut session = Session::initialize().unwrap();
            let result = session.open("does/not/exist.msh");
            assert!(matches!(result, Err(ResourceError::Open { .. })));
        }
        assert!(!Session::is_active());
    }

    #[test]
    fn test_data_requires_open_mesh() {
        let session = Session::initialize().unwrap();
        assert!(matches!(session.nodes(), Err(ResourceError::NoModel)));
        assert!(matches!(session.elements(), Err(ResourceError::NoModel)));
    }

    #[test]
    fn test_open_reader_exposes_raw_arrays() {
        let mut session = Session::initialize().unwrap();
        session
            .open_reader(fixtures::TET_WITH_TRIANGLE_V2.as_bytes())
            .unwrap();

        let (tags, coords) = session.nodes().unwrap();
        assert_eq!(tags.len(), 4);
        assert_eq!(coords.len(), 12);

        let blocks = session.elements().unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].is_tetrahedral());
    }
}

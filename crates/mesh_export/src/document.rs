//! Output document model
//!
//! [`MeshDocument`] mirrors the JSON written to disk:
//!
//! ```json
//! { "nodes": [[x, y, z], ...], "tetrahedra": [[i0, i1, i2, i3], ...] }
//! ```

use std::fmt;
use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{MalformedDataError, ResourceError};

/// A mesh node, serialized as `[x, y, z]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(pub [f64; 3]);

impl Node {
    /// Create a node from its coordinates
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// X coordinate
    pub const fn x(&self) -> f64 {
        self.0[0]
    }

    /// Y coordinate
    pub const fn y(&self) -> f64 {
        self.0[1]
    }

    /// Z coordinate
    pub const fn z(&self) -> f64 {
        self.0[2]
    }

    /// True when no coordinate is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }

    /// Position as a nalgebra point
    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.x(), self.y(), self.z())
    }
}

/// A linear tetrahedron, four 0-based node indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tetrahedron(pub [usize; 4]);

impl Tetrahedron {
    /// Node indices
    pub const fn indices(&self) -> [usize; 4] {
        self.0
    }
}

/// Nodes and tetrahedra of one exported mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshDocument {
    /// Node positions; the position in this list is the node index
    pub nodes: Vec<Node>,
    /// Tetrahedra referencing `nodes`
    pub tetrahedra: Vec<Tetrahedron>,
}

impl MeshDocument {
    /// Create a document
    pub fn new(nodes: Vec<Node>, tetrahedra: Vec<Tetrahedron>) -> Self {
        Self { nodes, tetrahedra }
    }

    /// Parse a document from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ResourceError> {
        serde_json::from_str(text).map_err(|e| ResourceError::Parse {
            line: e.line(),
            message: e.to_string(),
        })
    }

    /// Read a previously exported document
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ResourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Flatten tetrahedra into a 32-bit index buffer, four entries per element
    pub fn index_buffer(&self) -> Result<Vec<u32>, MalformedDataError> {
        self.tetrahedra
            .iter()
            .flat_map(|tet| tet.0)
            .map(|index| u32::try_from(index).map_err(|_| MalformedDataError::IndexOverflow { index }))
            .collect()
    }

    /// Counts and bounding box
    pub fn summary(&self) -> MeshSummary {
        let bounds = self.nodes.split_first().map(|(first, rest)| {
            rest.iter()
                .fold((first.point(), first.point()), |(min, max), node| {
                    let p = node.point();
                    (min.inf(&p), max.sup(&p))
                })
        });

        MeshSummary {
            node_count: self.nodes.len(),
            tetrahedron_count: self.tetrahedra.len(),
            bounds,
        }
    }
}

/// Size and extent of a document, for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSummary {
    /// Number of nodes
    pub node_count: usize,
    /// Number of tetrahedra
    pub tetrahedron_count: usize,
    /// Axis-aligned bounds `(min, max)`; `None` for an empty document
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
}

impl fmt::Display for MeshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} tetrahedra",
            self.node_count, self.tetrahedron_count
        )?;
        if let Some((min, max)) = &self.bounds {
            write!(
                f,
                ", bounds [{}, {}, {}] to [{}, {}, {}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet() -> MeshDocument {
        MeshDocument::new(
            vec![
                Node::new(0.0, 0.0, 0.0),
                Node::new(1.0, 0.0, 0.0),
                Node::new(0.0, 1.0, 0.0),
                Node::new(0.0, 0.0, 1.0),
            ],
            vec![Tetrahedron([0, 1, 2, 3])],
        )
    }

    #[test]
    fn test_node_is_finite() {
        assert!(Node::new(1.0, -2.0, 0.0).is_finite());
        assert!(!Node::new(0.0, f64::NAN, 0.0).is_finite());
        assert!(!Node::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let value = serde_json::to_value(unit_tet()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "nodes": [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                "tetrahedra": [[0, 1, 2, 3]]
            })
        );
    }

    #[test]
    fn test_keys_in_fixed_order() {
        let text = serde_json::to_string(&unit_tet()).unwrap();
        let nodes_at = text.find("\"nodes\"").unwrap();
        let tets_at = text.find("\"tetrahedra\"").unwrap();
        assert!(nodes_at < tets_at);
    }

    #[test]
    fn test_from_json_accepts_integer_coordinates() {
        let doc = MeshDocument::from_json_str(
            r#"{"nodes": [[0,0,0],[1,0,0],[0,1,0],[0,0,1]], "tetrahedra": [[0,1,2,3]]}"#,
        )
        .unwrap();
        assert_eq!(doc, unit_tet());
    }

    #[test]
    fn test_from_json_rejects_wrong_arity() {
        let result = MeshDocument::from_json_str(r#"{"nodes": [[0,0]], "tetrahedra": []}"#);
        assert!(matches!(result, Err(ResourceError::Parse { .. })));

        let result =
            MeshDocument::from_json_str(r#"{"nodes": [], "tetrahedra": [[0,1,2]], "extra": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_index_buffer_flattens() {
        let mut doc = unit_tet();
        doc.tetrahedra.push(Tetrahedron([3, 2, 1, 0]));
        assert_eq!(doc.index_buffer().unwrap(), vec![0, 1, 2, 3, 3, 2, 1, 0]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_index_buffer_overflow() {
        let big = u32::MAX as usize + 1;
        let doc = MeshDocument::new(Vec::new(), vec![Tetrahedron([0, 1, 2, big])]);
        assert_eq!(
            doc.index_buffer(),
            Err(MalformedDataError::IndexOverflow { index: big })
        );
    }

    #[test]
    fn test_summary_bounds() {
        let mut doc = unit_tet();
        doc.nodes.push(Node::new(-2.5, 0.5, 4.0));
        let summary = doc.summary();

        assert_eq!(summary.node_count, 5);
        assert_eq!(summary.tetrahedron_count, 1);
        let (min, max) = summary.bounds.unwrap();
        assert_relative_eq!(min.x, -2.5);
        assert_relative_eq!(min.y, 0.0);
        assert_relative_eq!(max.x, 1.0);
        assert_relative_eq!(max.z, 4.0);
        assert!(summary.to_string().starts_with("5 nodes, 1 tetrahedra"));
    }

    #[test]
    fn test_summary_of_empty_document() {
        let summary = MeshDocument::default().summary();
        assert_eq!(summary.bounds, None);
        assert_eq!(summary.to_string(), "0 nodes, 0 tetrahedra");
    }
}

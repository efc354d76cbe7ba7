//! Geometry reshaping
//!
//! Turns the provider's flat arrays into [`Node`] triples and 0-based
//! [`Tetrahedron`] tuples. Only blocks tagged [`ElementType::Tetrahedron`]
//! are kept; every other block is dropped.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::{MeshDocument, Node, Tetrahedron};
use crate::error::MalformedDataError;
use crate::loader::RawMesh;
use crate::msh::{ElementBlock, ElementType};

const NODES_PER_TET: usize = ElementType::Tetrahedron.node_count();

/// How element node references become node indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Subtract one from every reference (1-based to 0-based)
    #[default]
    Offset,
    /// Look references up in the node tag table
    TagMap,
}

impl FromStr for IndexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offset" => Ok(Self::Offset),
            "tag-map" | "tag_map" => Ok(Self::TagMap),
            other => Err(format!("unknown index mode '{other}' (expected offset or tag-map)")),
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offset => f.write_str("offset"),
            Self::TagMap => f.write_str("tag-map"),
        }
    }
}

/// Reshaping knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReshapeOptions {
    /// Reference to index conversion
    pub index_mode: IndexMode,
    /// Reject indices past the end of the node list
    pub validate_indices: bool,
}

/// Reference to index conversion, ready to apply
enum IndexResolver {
    Offset,
    TagMap(HashMap<usize, usize>),
}

impl IndexResolver {
    fn new(mode: IndexMode, node_tags: &[usize]) -> Self {
        match mode {
            IndexMode::Offset => Self::Offset,
            IndexMode::TagMap => Self::TagMap(
                node_tags
                    .iter()
                    .enumerate()
                    .map(|(position, &tag)| (tag, position))
                    .collect(),
            ),
        }
    }

    fn resolve(&self, reference: usize, element: usize) -> Result<usize, MalformedDataError> {
        match self {
            Self::Offset => reference
                .checked_sub(1)
                .ok_or(MalformedDataError::ZeroReference { element }),
            Self::TagMap(positions) => positions
                .get(&reference)
                .copied()
                .ok_or(MalformedDataError::UnknownNodeTag {
                    element,
                    tag: reference,
                }),
        }
    }
}

/// Group a flat coordinate array into nodes
pub fn reshape_nodes(coords: &[f64]) -> Result<Vec<Node>, MalformedDataError> {
    if coords.len() % 3 != 0 {
        return Err(MalformedDataError::CoordinateCount { len: coords.len() });
    }

    Ok(coords
        .chunks_exact(3)
        .map(|c| Node::new(c[0], c[1], c[2]))
        .collect())
}

/// Collect tetrahedra from the tetrahedral blocks, 1-based references to 0-based indices
pub fn reshape_tetrahedra(blocks: &[ElementBlock]) -> Result<Vec<Tetrahedron>, MalformedDataError> {
    collect_tetrahedra(blocks, &IndexResolver::Offset)
}

/// Collect tetrahedra, resolving references through the node tag table
pub fn reshape_tetrahedra_by_tag(
    blocks: &[ElementBlock],
    node_tags: &[usize],
) -> Result<Vec<Tetrahedron>, MalformedDataError> {
    collect_tetrahedra(blocks, &IndexResolver::new(IndexMode::TagMap, node_tags))
}

fn collect_tetrahedra(
    blocks: &[ElementBlock],
    resolver: &IndexResolver,
) -> Result<Vec<Tetrahedron>, MalformedDataError> {
    let mut tetrahedra = Vec::new();

    for block in blocks {
        if !block.is_tetrahedral() {
            log::debug!(
                "Skipping element block of type {} ({} references)",
                block.element_type,
                block.node_refs.len()
            );
            continue;
        }

        if block.node_refs.len() % NODES_PER_TET != 0 {
            return Err(MalformedDataError::BlockLength {
                element_type: block.element_type,
                len: block.node_refs.len(),
                nodes_per_element: NODES_PER_TET,
            });
        }

        tetrahedra.reserve(block.node_refs.len() / NODES_PER_TET);
        for refs in block.node_refs.chunks_exact(NODES_PER_TET) {
            let element = tetrahedra.len();
            let mut indices = [0usize; NODES_PER_TET];
            for (slot, &reference) in indices.iter_mut().zip(refs) {
                *slot = resolver.resolve(reference, element)?;
            }
            tetrahedra.push(Tetrahedron(indices));
        }
    }

    Ok(tetrahedra)
}

/// Check that every index points into the node list
pub fn check_indices(
    tetrahedra: &[Tetrahedron],
    node_count: usize,
) -> Result<(), MalformedDataError> {
    for (element, tet) in tetrahedra.iter().enumerate() {
        if let Some(&index) = tet.0.iter().find(|&&index| index >= node_count) {
            return Err(MalformedDataError::IndexOutOfRange {
                element,
                index,
                node_count,
            });
        }
    }
    Ok(())
}

/// Build the output document from raw provider arrays
pub fn reshape(raw: &RawMesh, options: ReshapeOptions) -> Result<MeshDocument, MalformedDataError> {
    let nodes = reshape_nodes(&raw.coords)?;
    let resolver = IndexResolver::new(options.index_mode, &raw.node_tags);
    let tetrahedra = collect_tetrahedra(&raw.blocks, &resolver)?;

    if options.validate_indices {
        check_indices(&tetrahedra, nodes.len())?;
    }

    Ok(MeshDocument::new(nodes, tetrahedra))
}

//! MSH ASCII reader
//!
//! Reads Gmsh MSH files in format 2.2 and 4.1 (ASCII only). The reader keeps
//! the raw provider view of the mesh: node tags and flat coordinates in file
//! order, plus one [`ElementBlock`] per element type with 1-based node
//! references. Sections other than `$MeshFormat`, `$Nodes` and `$Elements`
//! are skipped.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::str::FromStr;

use super::element::{ElementBlock, ElementType};
use crate::error::ResourceError;

/// Upper bound on entries reserved up front from a count read in the file
const PREALLOC_LIMIT: usize = 1 << 20;

/// Supported MSH layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MshVersion {
    /// Legacy 2.x layout (one line per node / element)
    V2,
    /// 4.1 layout (entity blocks)
    V41,
}

/// Everything the reader extracts from a mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct MshModel {
    /// Layout the file was written in
    pub version: MshVersion,
    /// Node tags, in file order
    pub node_tags: Vec<usize>,
    /// Flat `x y z` coordinates, aligned with `node_tags`
    pub coords: Vec<f64>,
    /// Element blocks, one per type, ordered by type code
    pub blocks: Vec<ElementBlock>,
}

impl MshModel {
    /// Number of nodes read
    pub fn node_count(&self) -> usize {
        self.node_tags.len()
    }
}

/// Line source that remembers where it is, for error messages
struct LineReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ResourceError> {
        match self.lines.next() {
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line?))
            }
            None => Ok(None),
        }
    }

    /// Next non-blank line; running out of input is an error
    fn expect_line(&mut self, what: &str) -> Result<String, ResourceError> {
        loop {
            match self.next_line()? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => return Ok(line),
                None => {
                    return Err(self.error(format!("unexpected end of file while reading {what}")))
                }
            }
        }
    }

    /// The next non-blank line must be exactly `marker`
    fn expect_end(&mut self, marker: &str) -> Result<(), ResourceError> {
        let line = self.expect_line(marker)?;
        if line.trim() == marker {
            Ok(())
        } else {
            Err(self.error(format!("expected {marker}, found '{}'", line.trim())))
        }
    }

    fn skip_to(&mut self, marker: &str) -> Result<(), ResourceError> {
        while let Some(line) = self.next_line()? {
            if line.trim() == marker {
                return Ok(());
            }
        }
        Err(self.error(format!("missing {marker}")))
    }

    fn field<'a, T: FromStr>(
        &self,
        parts: &mut impl Iterator<Item = &'a str>,
        what: &str,
    ) -> Result<T, ResourceError> {
        let token = parts
            .next()
            .ok_or_else(|| self.error(format!("missing {what}")))?;
        token
            .parse()
            .map_err(|_| self.error(format!("invalid {what} '{token}'")))
    }

    /// Three finite coordinates from the front of `parts`
    fn point<'a>(
        &self,
        parts: &mut impl Iterator<Item = &'a str>,
        coords: &mut Vec<f64>,
    ) -> Result<(), ResourceError> {
        for axis in ["x coordinate", "y coordinate", "z coordinate"] {
            let value: f64 = self.field(parts, axis)?;
            if !value.is_finite() {
                return Err(self.error(format!("non-finite {axis} '{value}'")));
            }
            coords.push(value);
        }
        Ok(())
    }

    /// Tag and coordinate buffers for `count` nodes, without trusting `count`
    fn node_buffers(&self, count: usize) -> Result<(Vec<usize>, Vec<f64>), ResourceError> {
        let coord_len = count
            .checked_mul(3)
            .ok_or_else(|| self.error(format!("node count {count} is too large")))?;
        Ok((
            Vec::with_capacity(count.min(PREALLOC_LIMIT)),
            Vec::with_capacity(coord_len.min(3 * PREALLOC_LIMIT)),
        ))
    }

    fn count(&mut self, what: &str) -> Result<usize, ResourceError> {
        let line = self.expect_line(what)?;
        self.field(&mut line.split_whitespace(), what)
    }

    fn error(&self, message: impl Into<String>) -> ResourceError {
        ResourceError::Parse {
            line: self.line_no,
            message: message.into(),
        }
    }
}

/// Parse an ASCII MSH stream
pub fn parse_msh<R: BufRead>(reader: R) -> Result<MshModel, ResourceError> {
    let mut lines = LineReader::new(reader);
    let mut version = None;
    let mut nodes = None;
    let mut elements: BTreeMap<i32, Vec<usize>> = BTreeMap::new();

    while let Some(line) = lines.next_line()? {
        let section = line.trim();
        match section {
            "" => {}
            "$MeshFormat" => version = Some(parse_mesh_format(&mut lines)?),
            "$Nodes" => {
                let parsed = match require_format(version)? {
                    MshVersion::V2 => parse_nodes_v2(&mut lines)?,
                    MshVersion::V41 => parse_nodes_v41(&mut lines)?,
                };
                nodes = Some(parsed);
            }
            "$Elements" => match require_format(version)? {
                MshVersion::V2 => parse_elements_v2(&mut lines, &mut elements)?,
                MshVersion::V41 => parse_elements_v41(&mut lines, &mut elements)?,
            },
            other if other.starts_with('$') => {
                log::trace!("Skipping section {other}");
                let end = format!("$End{}", &other[1..]);
                lines.skip_to(&end)?;
            }
            other => {
                return Err(lines.error(format!("unexpected content outside a section: '{other}'")))
            }
        }
    }

    let version = require_format(version)?;
    let (node_tags, coords) = nodes.ok_or_else(|| ResourceError::MissingSection("Nodes".into()))?;
    let blocks = elements
        .into_iter()
        .map(|(element_type, node_refs)| ElementBlock::new(element_type, node_refs))
        .collect();

    Ok(MshModel {
        version,
        node_tags,
        coords,
        blocks,
    })
}

fn require_format(version: Option<MshVersion>) -> Result<MshVersion, ResourceError> {
    version.ok_or_else(|| ResourceError::MissingSection("MeshFormat".into()))
}

fn parse_mesh_format<R: BufRead>(lines: &mut LineReader<R>) -> Result<MshVersion, ResourceError> {
    let header = lines.expect_line("mesh format")?;
    let mut parts = header.split_whitespace();
    let version_str = parts
        .next()
        .ok_or_else(|| lines.error("empty mesh format line"))?;

    let version = if version_str.starts_with("2.") || version_str == "2" {
        MshVersion::V2
    } else if version_str == "4.1" {
        // 4.0 uses a different entity block layout
        MshVersion::V41
    } else {
        return Err(ResourceError::UnsupportedVersion(version_str.to_string()));
    };

    let file_type: u8 = lines.field(&mut parts, "file type")?;
    if file_type != 0 {
        return Err(ResourceError::BinaryUnsupported);
    }

    lines.skip_to("$EndMeshFormat")?;
    Ok(version)
}

fn parse_nodes_v2<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<(Vec<usize>, Vec<f64>), ResourceError> {
    let count = lines.count("node count")?;
    let (mut tags, mut coords) = lines.node_buffers(count)?;

    // Format: node_tag x y z
    for _ in 0..count {
        let line = lines.expect_line("node")?;
        let mut parts = line.split_whitespace();
        tags.push(lines.field(&mut parts, "node tag")?);
        lines.point(&mut parts, &mut coords)?;
    }

    lines.expect_end("$EndNodes")?;
    Ok((tags, coords))
}

fn parse_nodes_v41<R: BufRead>(
    lines: &mut LineReader<R>,
) -> Result<(Vec<usize>, Vec<f64>), ResourceError> {
    // Format: numEntityBlocks numNodes minNodeTag maxNodeTag
    let header = lines.expect_line("node header")?;
    let mut parts = header.split_whitespace();
    let num_blocks: usize = lines.field(&mut parts, "entity block count")?;
    let num_nodes: usize = lines.field(&mut parts, "node count")?;

    let (mut tags, mut coords) = lines.node_buffers(num_nodes)?;

    for _ in 0..num_blocks {
        // Format: entityDim entityTag parametric numNodesInBlock
        let block = lines.expect_line("node block header")?;
        let mut parts = block.split_whitespace();
        let _entity_dim: i32 = lines.field(&mut parts, "entity dimension")?;
        let _entity_tag: i32 = lines.field(&mut parts, "entity tag")?;
        let _parametric: u8 = lines.field(&mut parts, "parametric flag")?;
        let in_block: usize = lines.field(&mut parts, "block node count")?;

        for _ in 0..in_block {
            let line = lines.expect_line("node tag")?;
            tags.push(lines.field(&mut line.split_whitespace(), "node tag")?);
        }

        // Parametric coordinates, if any, follow x y z and are ignored
        for _ in 0..in_block {
            let line = lines.expect_line("node coordinates")?;
            lines.point(&mut line.split_whitespace(), &mut coords)?;
        }
    }

    if tags.len() != num_nodes {
        return Err(lines.error(format!(
            "node header announces {num_nodes} nodes, blocks contain {}",
            tags.len()
        )));
    }

    lines.expect_end("$EndNodes")?;
    Ok((tags, coords))
}

fn parse_elements_v2<R: BufRead>(
    lines: &mut LineReader<R>,
    elements: &mut BTreeMap<i32, Vec<usize>>,
) -> Result<(), ResourceError> {
    let count = lines.count("element count")?;

    // Format: elem_id elem_type n_tags tag1 ... tagN node1 node2 ...
    for _ in 0..count {
        let line = lines.expect_line("element")?;
        let mut parts = line.split_whitespace();
        let _id: usize = lines.field(&mut parts, "element id")?;
        let element_type: i32 = lines.field(&mut parts, "element type")?;
        let n_tags: usize = lines.field(&mut parts, "tag count")?;
        for _ in 0..n_tags {
            let _tag: i64 = lines.field(&mut parts, "element tag")?;
        }

        let refs = parse_refs(lines, parts)?;
        check_node_count(lines, element_type, refs.len())?;
        elements.entry(element_type).or_default().extend(refs);
    }

    lines.expect_end("$EndElements")
}

fn parse_elements_v41<R: BufRead>(
    lines: &mut LineReader<R>,
    elements: &mut BTreeMap<i32, Vec<usize>>,
) -> Result<(), ResourceError> {
    // Format: numEntityBlocks numElements minElementTag maxElementTag
    let header = lines.expect_line("element header")?;
    let mut parts = header.split_whitespace();
    let num_blocks: usize = lines.field(&mut parts, "entity block count")?;
    let num_elements: usize = lines.field(&mut parts, "element count")?;

    let mut seen = 0;
    for _ in 0..num_blocks {
        // Format: entityDim entityTag elementType numElementsInBlock
        let block = lines.expect_line("element block header")?;
        let mut parts = block.split_whitespace();
        let _entity_dim: i32 = lines.field(&mut parts, "entity dimension")?;
        let _entity_tag: i32 = lines.field(&mut parts, "entity tag")?;
        let element_type: i32 = lines.field(&mut parts, "element type")?;
        let in_block: usize = lines.field(&mut parts, "block element count")?;

        let target = elements.entry(element_type).or_default();
        for _ in 0..in_block {
            // Format: elementTag node1 node2 ...
            let line = lines.expect_line("element")?;
            let mut parts = line.split_whitespace();
            let _id: usize = lines.field(&mut parts, "element id")?;
            let refs = parse_refs(lines, parts)?;
            check_node_count(lines, element_type, refs.len())?;
            target.extend(refs);
        }
        seen += in_block;
    }

    if seen != num_elements {
        return Err(lines.error(format!(
            "element header announces {num_elements} elements, blocks contain {seen}"
        )));
    }

    lines.expect_end("$EndElements")
}

fn parse_refs<'a, R: BufRead>(
    lines: &LineReader<R>,
    parts: impl Iterator<Item = &'a str>,
) -> Result<Vec<usize>, ResourceError> {
    parts
        .map(|token| {
            token
                .parse()
                .map_err(|_| lines.error(format!("invalid node reference '{token}'")))
        })
        .collect()
}

fn check_node_count<R: BufRead>(
    lines: &LineReader<R>,
    element_type: i32,
    found: usize,
) -> Result<(), ResourceError> {
    match ElementType::from_tag(element_type) {
        Some(kind) if kind.node_count() != found => Err(lines.error(format!(
            "element of type {element_type} needs {} nodes, found {found}",
            kind.node_count()
        ))),
        None if found == 0 => Err(lines.error(format!(
            "element of type {element_type} has no nodes"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msh::fixtures;

    fn parse(text: &str) -> Result<MshModel, ResourceError> {
        parse_msh(text.as_bytes())
    }

    #[test]
    fn test_parse_v2_mesh() {
        let model = parse(fixtures::TET_WITH_TRIANGLE_V2).unwrap();
        assert_eq!(model.version, MshVersion::V2);
        assert_eq!(model.node_tags, vec![1, 2, 3, 4]);
        assert_eq!(
            model.coords,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            model.blocks,
            vec![
                ElementBlock::new(2, vec![1, 2, 3]),
                ElementBlock::new(4, vec![1, 2, 3, 4]),
            ]
        );
    }

    #[test]
    fn test_parse_v41_matches_v2() {
        let v2 = parse(fixtures::TET_WITH_TRIANGLE_V2).unwrap();
        let v41 = parse(fixtures::TET_WITH_TRIANGLE_V41).unwrap();
        assert_eq!(v41.version, MshVersion::V41);
        assert_eq!(v41.node_tags, v2.node_tags);
        assert_eq!(v41.coords, v2.coords);
        assert_eq!(v41.blocks, v2.blocks);
    }

    #[test]
    fn test_blocks_merge_per_type() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n5\n1 0 0 0\n2 1 0 0\n3 0 1 0\n4 0 0 1\n5 1 1 1\n$EndNodes\n\
$Elements\n3\n1 4 2 0 1 1 2 3 4\n2 1 2 0 1 1 2\n3 4 2 0 2 2 3 4 5\n$EndElements\n";
        let model = parse(text).unwrap();
        assert_eq!(
            model.blocks,
            vec![
                ElementBlock::new(1, vec![1, 2]),
                ElementBlock::new(4, vec![1, 2, 3, 4, 2, 3, 4, 5]),
            ]
        );
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$PhysicalNames\n1\n3 1 \"volume\"\n$EndPhysicalNames\n\
$Nodes\n1\n1 0.5 0.25 0.125\n$EndNodes\n\
$NodeData\n1\n\"temperature\"\n$EndNodeData\n";
        let model = parse(text).unwrap();
        assert_eq!(model.coords, vec![0.5, 0.25, 0.125]);
        assert!(model.blocks.is_empty());
    }

    #[test]
    fn test_binary_file_rejected() {
        let text = "$MeshFormat\n4.1 1 8\n$EndMeshFormat\n";
        assert!(matches!(parse(text), Err(ResourceError::BinaryUnsupported)));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let text = "$MeshFormat\n3.0 0 8\n$EndMeshFormat\n";
        match parse(text) {
            Err(ResourceError::UnsupportedVersion(version)) => assert_eq!(version, "3.0"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_msh_40_rejected() {
        let text = "$MeshFormat\n4 0 8\n$EndMeshFormat\n";
        assert!(matches!(parse(text), Err(ResourceError::UnsupportedVersion(v)) if v == "4"));
        let text = "$MeshFormat\n4.0 0 8\n$EndMeshFormat\n";
        assert!(matches!(parse(text), Err(ResourceError::UnsupportedVersion(v)) if v == "4.0"));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_huge_node_count_is_a_parse_error() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n4000000000000000000\n1 0 0 0\n$EndNodes\n";
        assert!(matches!(parse(text), Err(ResourceError::Parse { line: 7, .. })));

        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n18446744073709551615\n$EndNodes\n";
        match parse(text) {
            Err(ResourceError::Parse { line, message }) => {
                assert_eq!(line, 5);
                assert!(message.contains("too large"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let text = "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n$Nodes\n1 4000000000000000000 1 1\n3 1 0 1\n1\n0 0 0\n$EndNodes\n";
        assert!(matches!(parse(text), Err(ResourceError::Parse { .. })));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        for bad in ["nan", "inf", "-inf", "NaN", "infinity"] {
            let text = format!("$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n1\n1 0 {bad} 0\n$EndNodes\n");
            match parse(&text) {
                Err(ResourceError::Parse { line, message }) => {
                    assert_eq!(line, 6);
                    assert!(message.contains("y coordinate"), "{message}");
                }
                other => panic!("{bad}: unexpected result: {other:?}"),
            }
        }

        let text = "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n$Nodes\n1 1 1 1\n3 1 0 1\n1\nnan 0 0\n$EndNodes\n";
        assert!(matches!(parse(text), Err(ResourceError::Parse { line: 8, .. })));
    }

    #[test]
    fn test_missing_nodes_section() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n";
        match parse(text) {
            Err(ResourceError::MissingSection(name)) => assert_eq!(name, "Nodes"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_nodes_before_format_rejected() {
        let text = "$Nodes\n1\n1 0 0 0\n$EndNodes\n";
        assert!(matches!(parse(text), Err(ResourceError::MissingSection(_))));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n2\n1 0 0 0\n2 1 abc 0\n$EndNodes\n";
        match parse(text) {
            Err(ResourceError::Parse { line, message }) => {
                assert_eq!(line, 7);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_nodes_section() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n3\n1 0 0 0\n";
        assert!(matches!(parse(text), Err(ResourceError::Parse { .. })));
    }

    #[test]
    fn test_wrong_node_count_for_tetrahedron() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n3\n1 0 0 0\n2 1 0 0\n3 0 1 0\n$EndNodes\n\
$Elements\n1\n1 4 2 0 1 1 2 3\n$EndElements\n";
        match parse(text) {
            Err(ResourceError::Parse { message, .. }) => assert!(message.contains("needs 4 nodes")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_v41_node_total_mismatch() {
        let text = "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n\
$Nodes\n1 2 1 2\n3 1 0 1\n1\n0 0 0\n$EndNodes\n";
        assert!(matches!(parse(text), Err(ResourceError::Parse { .. })));
    }
}

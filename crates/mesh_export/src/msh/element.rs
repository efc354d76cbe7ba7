//! Gmsh element type tags and element blocks

/// Gmsh element types (MSH type codes)
///
/// Only [`ElementType::Tetrahedron`] is exported; the remaining variants let
/// the reader check node counts and log what was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementType {
    /// 2-node line
    Line = 1,
    /// 3-node triangle
    Triangle = 2,
    /// 4-node quadrangle
    Quadrangle = 3,
    /// 4-node tetrahedron
    Tetrahedron = 4,
    /// 8-node hexahedron
    Hexahedron = 5,
    /// 6-node prism
    Prism = 6,
    /// 5-node pyramid
    Pyramid = 7,
    /// 3-node second order line
    Line3 = 8,
    /// 6-node second order triangle
    Triangle6 = 9,
    /// 9-node second order quadrangle
    Quadrangle9 = 10,
    /// 10-node second order tetrahedron
    Tetrahedron10 = 11,
    /// 27-node second order hexahedron
    Hexahedron27 = 12,
    /// 18-node second order prism
    Prism18 = 13,
    /// 14-node second order pyramid
    Pyramid14 = 14,
    /// 1-node point
    Point = 15,
    /// 8-node serendipity quadrangle
    Quadrangle8 = 16,
    /// 20-node serendipity hexahedron
    Hexahedron20 = 17,
}

impl ElementType {
    /// MSH type code
    pub const fn tag(self) -> i32 {
        self as i32
    }

    /// Look up a type from its MSH code
    pub const fn from_tag(tag: i32) -> Option<Self> {
        let kind = match tag {
            1 => Self::Line,
            2 => Self::Triangle,
            3 => Self::Quadrangle,
            4 => Self::Tetrahedron,
            5 => Self::Hexahedron,
            6 => Self::Prism,
            7 => Self::Pyramid,
            8 => Self::Line3,
            9 => Self::Triangle6,
            10 => Self::Quadrangle9,
            11 => Self::Tetrahedron10,
            12 => Self::Hexahedron27,
            13 => Self::Prism18,
            14 => Self::Pyramid14,
            15 => Self::Point,
            16 => Self::Quadrangle8,
            17 => Self::Hexahedron20,
            _ => return None,
        };
        Some(kind)
    }

    /// Number of nodes per element
    pub const fn node_count(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Triangle | Self::Line3 => 3,
            Self::Quadrangle | Self::Tetrahedron => 4,
            Self::Pyramid => 5,
            Self::Prism | Self::Triangle6 => 6,
            Self::Hexahedron | Self::Quadrangle8 => 8,
            Self::Quadrangle9 => 9,
            Self::Tetrahedron10 => 10,
            Self::Pyramid14 => 14,
            Self::Prism18 => 18,
            Self::Hexahedron20 => 20,
            Self::Hexahedron27 => 27,
        }
    }

    /// Topological dimension
    pub const fn dimension(self) -> u8 {
        match self {
            Self::Point => 0,
            Self::Line | Self::Line3 => 1,
            Self::Triangle
            | Self::Quadrangle
            | Self::Triangle6
            | Self::Quadrangle9
            | Self::Quadrangle8 => 2,
            _ => 3,
        }
    }
}

/// All elements of one type, as the provider hands them out
///
/// `node_refs` is the flat concatenation of every element's node tags,
/// 1-based as stored in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBlock {
    /// MSH element type code
    pub element_type: i32,
    /// Flat node references
    pub node_refs: Vec<usize>,
}

impl ElementBlock {
    /// Create a block
    pub fn new(element_type: i32, node_refs: Vec<usize>) -> Self {
        Self {
            element_type,
            node_refs,
        }
    }

    /// Known element type, if the code is recognised
    pub const fn kind(&self) -> Option<ElementType> {
        ElementType::from_tag(self.element_type)
    }

    /// Whether this block holds linear tetrahedra
    pub fn is_tetrahedral(&self) -> bool {
        self.element_type == ElementType::Tetrahedron.tag()
    }

    /// Number of whole elements, when the type is known
    pub fn element_count(&self) -> Option<usize> {
        self.kind().map(|kind| self.node_refs.len() / kind.node_count())
    }
}

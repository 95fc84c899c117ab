//! Renderable document tree: an ordered list of semantic nodes carrying
//! resolved content and no layout geometry. Geometry belongs to the raster
//! stage.

use greffe_core::ClassificationLevel;
use serde::{Deserialize, Serialize};

/// Flat RGB color used by banner nodes and the raster backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const INK: Color = Color([17, 24, 39]);
    pub const MUTED: Color = Color([107, 114, 128]);
    pub const RULE: Color = Color([209, 213, 219]);
    pub const PAPER: Color = Color([255, 255, 255]);
}

/// Banner color for a classification level. Fixed small palette; anything
/// unrecognized gets the neutral color.
pub fn classification_color(level: ClassificationLevel) -> Color {
    match level {
        ClassificationLevel::TopSecret => Color([127, 29, 29]),
        ClassificationLevel::Secret => Color([185, 28, 28]),
        ClassificationLevel::Confidential => Color([194, 120, 3]),
        ClassificationLevel::Restricted => Color([30, 64, 175]),
        ClassificationLevel::Public => Color([21, 128, 61]),
        ClassificationLevel::Unknown => Color([75, 85, 99]),
    }
}

/// One resolved field row inside a table node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
    pub redacted: bool,
}

/// One renderable unit of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Full-width classification banner.
    Banner { text: String, color: Color },
    /// Institutional header: title, subtitle, optional seal, reference, date.
    Header {
        title: String,
        subtitle: Option<String>,
        show_seal: bool,
        reference: String,
        date: String,
    },
    /// Bordered legal/security notice.
    Notice { text: String },
    /// Two-column identity card (authoring personnel).
    Identity { rows: Vec<(String, String)> },
    /// Tabular field list.
    FieldTable { title: Option<String>, rows: Vec<FieldRow> },
    /// Free-text body section.
    Narrative { title: Option<String>, text: String },
    /// Signature line with stamp: author identity plus optional specialty.
    Signature { name: String, badge: String, specialty: Option<String> },
    /// Footer text line.
    Footer { text: String },
    /// Fixed vertical space.
    Spacer { height_mm: f32 },
    /// Empty block kept for drift tolerance and per-block failure recovery.
    Placeholder,
}

/// The renderable document, in stored block order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    pub nodes: Vec<Node>,
}

impl DocumentTree {
    /// All field rows across the tree, in order. Test and audit helper.
    pub fn field_rows(&self) -> impl Iterator<Item = &FieldRow> {
        self.nodes.iter().flat_map(|n| match n {
            Node::FieldTable { rows, .. } => rows.iter(),
            _ => [].iter(),
        })
    }
}

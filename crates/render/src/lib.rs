//! Layout interpreter. Turns a document template, bound field values and a
//! redaction set into a renderable [`DocumentTree`], ready for the raster
//! stage. One broken block never prevents the rest of the document from
//! rendering.

mod blocks;
pub mod tree;
pub mod value;

pub use tree::{classification_color, Color, DocumentTree, FieldRow, Node};
pub use value::{
    format_value, resolve_value, strip_markup, value_by_label, REDACTION_MARKER,
};

use chrono::{DateTime, Utc};
use greffe_core::{ClassificationLevel, DocumentTemplate, FieldValues};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Document locale. Drives date formats and the yes/no/empty tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    Fr,
    En,
}

impl Default for Locale {
    fn default() -> Self {
        Self::Fr
    }
}

impl Locale {
    pub fn yes(&self) -> &'static str {
        match self {
            Self::Fr => "Oui",
            Self::En => "Yes",
        }
    }

    pub fn no(&self) -> &'static str {
        match self {
            Self::Fr => "Non",
            Self::En => "No",
        }
    }

    /// Explicit empty-value token; a missing value never renders as "".
    pub fn empty_placeholder(&self) -> &'static str {
        match self {
            Self::Fr => "Non renseigné",
            Self::En => "Not provided",
        }
    }

    pub fn date_format(&self) -> &'static str {
        match self {
            Self::Fr => "%d/%m/%Y",
            Self::En => "%Y-%m-%d",
        }
    }
}

/// Authoring identity stamped on personnel and signature blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub badge: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Per-render context: author, locale, reference id and generation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    pub author: Author,
    #[serde(default)]
    pub locale: Locale,
    pub reference: String,
    pub generated_at: DateTime<Utc>,
}

impl RenderContext {
    pub fn date_string(&self) -> String {
        self.generated_at
            .format(self.locale.date_format())
            .to_string()
    }
}

/// Renders one bound document instance to its document tree.
///
/// Block-based templates take precedence over the fixed layout whenever the
/// block list is non-empty. Schema-only templates render the standard
/// header/body/footer report shape.
pub fn render(
    template: &DocumentTemplate,
    values: &FieldValues,
    narrative: Option<&str>,
    redacted: &BTreeSet<String>,
    ctx: &RenderContext,
) -> DocumentTree {
    let nodes = if template.layout_settings.uses_blocks() {
        blocks::render_blocks(template, values, narrative, redacted, ctx)
    } else {
        standard_layout(template, values, narrative, redacted, ctx)
    };
    DocumentTree { nodes }
}

/// Clearance tier shown in the standard header banner.
fn clearance_classification(min_clearance: i32) -> ClassificationLevel {
    match min_clearance {
        c if c >= 4 => ClassificationLevel::Secret,
        3 => ClassificationLevel::Confidential,
        2 => ClassificationLevel::Restricted,
        _ => ClassificationLevel::Public,
    }
}

/// Fixed header/body/footer document for field-schema-only templates.
fn standard_layout(
    template: &DocumentTemplate,
    values: &FieldValues,
    narrative: Option<&str>,
    redacted: &BTreeSet<String>,
    ctx: &RenderContext,
) -> Vec<Node> {
    let layout = &template.layout_settings;
    let level = clearance_classification(template.min_clearance);
    let mut nodes = vec![
        Node::Banner {
            text: level.label().to_string(),
            color: classification_color(level),
        },
        Node::Header {
            title: layout
                .header_title
                .clone()
                .unwrap_or_else(|| template.name.clone()),
            subtitle: layout
                .header_subtitle
                .clone()
                .or_else(|| Some(template.category.clone())),
            show_seal: layout.show_logo,
            reference: ctx.reference.clone(),
            date: ctx.date_string(),
        },
    ];

    let rows: Vec<FieldRow> = template
        .schema
        .iter()
        .map(|field| FieldRow {
            label: field.label.clone(),
            value: resolve_value(field, values, redacted, ctx.locale),
            redacted: redacted.contains(&field.id),
        })
        .collect();
    if !rows.is_empty() {
        nodes.push(Node::FieldTable { title: None, rows });
    }

    if let Some(content) = layout.static_content.as_deref().filter(|c| !c.is_empty()) {
        nodes.push(Node::Narrative {
            title: None,
            text: strip_markup(content),
        });
    }

    if let Some(body) = narrative.filter(|n| !n.trim().is_empty()) {
        nodes.push(Node::Narrative {
            title: Some(match ctx.locale {
                Locale::Fr => "Récit des faits".to_string(),
                Locale::En => "Narrative".to_string(),
            }),
            text: strip_markup(body),
        });
    }

    if let Some(footer) = layout.footer_text.clone().filter(|f| !f.is_empty()) {
        nodes.push(Node::Footer { text: footer });
    }
    nodes
}

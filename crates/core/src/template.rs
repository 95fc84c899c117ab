//! Document template schema: typed field definitions plus a layout
//! specification, either a fixed standard layout or an ordered list of
//! typed blocks (v2 layouts).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Field input type. Controls both editing widgets upstream and value
/// formatting at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Date,
    Boolean,
    Textarea,
}

/// One field definition inside a template schema.
///
/// Identity is `id`, unique within a template. `label` is display text only;
/// lookups by label must tolerate case differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl TemplateField {
    pub fn new(id: &str, label: &str, field_type: FieldType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required: false,
            options: Vec::new(),
        }
    }
}

/// Stored (wire) form of a layout block: a type tag plus a loosely-typed
/// `config` bag whose recognized keys depend on the type. Kept for
/// compatibility with templates saved by older editors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TemplateField>,
}

/// Document classification tier, as declared by a classification banner
/// block. Unrecognized levels map to [`ClassificationLevel::Unknown`] and
/// render with a neutral banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLevel {
    TopSecret,
    Secret,
    Confidential,
    Restricted,
    Public,
    Unknown,
}

impl ClassificationLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "top_secret" | "top-secret" | "tres_secret" => Self::TopSecret,
            "secret" => Self::Secret,
            "confidential" | "confidentiel" => Self::Confidential,
            "restricted" | "restreint" => Self::Restricted,
            "public" => Self::Public,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TopSecret => "TRÈS SECRET",
            Self::Secret => "SECRET",
            Self::Confidential => "CONFIDENTIEL",
            Self::Restricted => "DIFFUSION RESTREINTE",
            Self::Public => "PUBLIC",
            Self::Unknown => "NON CLASSIFIÉ",
        }
    }
}

/// Validated, typed form of a layout block.
///
/// `Block::from_raw` never fails: a malformed block degrades to defaults and
/// an unrecognized type becomes [`Block::Unknown`], which renders empty.
/// Save-time validation ([`validate_blocks`]) reports the degradations so the
/// template editor can surface them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Classification { level: ClassificationLevel },
    Header { show_seal: bool },
    Warning { text: Option<String> },
    Personnel,
    Suspect { fields: Vec<TemplateField> },
    Fields { fields: Vec<TemplateField> },
    Narrative,
    Signature,
    Spacer { height_mm: f32 },
    Footer,
    Vehicle,
    Evidence,
    Unknown,
}

/// Default vertical space for a spacer block missing its `height` key.
pub const DEFAULT_SPACER_MM: f32 = 8.0;

impl Block {
    /// Converts a stored block into its typed form, applying defaults for
    /// missing config keys. Unknown types are preserved as `Unknown` to
    /// tolerate forward and backward schema drift.
    pub fn from_raw(raw: &RawBlock) -> Self {
        match raw.block_type.as_str() {
            "classification" => {
                let level = raw
                    .config
                    .get("level")
                    .and_then(Value::as_str)
                    .map(ClassificationLevel::parse)
                    .unwrap_or(ClassificationLevel::Unknown);
                Block::Classification { level }
            }
            "header" => {
                let show_seal = raw
                    .config
                    .get("show_seal")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                Block::Header { show_seal }
            }
            "warning" => Block::Warning {
                text: raw
                    .config
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "personnel" => Block::Personnel,
            "suspect" => Block::Suspect {
                fields: raw.fields.clone(),
            },
            "fields" => Block::Fields {
                fields: raw.fields.clone(),
            },
            "narrative" => Block::Narrative,
            "signature" => Block::Signature,
            "spacer" => {
                let height_mm = raw
                    .config
                    .get("height")
                    .and_then(Value::as_f64)
                    .map(|h| h as f32)
                    .filter(|h| h.is_finite() && *h >= 0.0)
                    .unwrap_or(DEFAULT_SPACER_MM);
                Block::Spacer { height_mm }
            }
            "footer" => Block::Footer,
            "vehicle" => Block::Vehicle,
            "evidence" => Block::Evidence,
            other => {
                log::debug!("unrecognized block type '{}', will render empty", other);
                Block::Unknown
            }
        }
    }
}

/// Save-time validation pass over a block list. Returns human-readable
/// warnings; none of them block a save, they flag silent degradations.
pub fn validate_blocks(blocks: &[RawBlock]) -> Vec<String> {
    let mut warnings = Vec::new();
    for raw in blocks {
        match Block::from_raw(raw) {
            Block::Unknown => {
                warnings.push(format!("bloc '{}': type inconnu '{}'", raw.id, raw.block_type))
            }
            Block::Classification {
                level: ClassificationLevel::Unknown,
            } => warnings.push(format!("bloc '{}': niveau de classification inconnu", raw.id)),
            Block::Suspect { fields } | Block::Fields { fields } if fields.is_empty() => {
                warnings.push(format!("bloc '{}': aucune colonne définie", raw.id))
            }
            Block::Spacer { height_mm } if height_mm == DEFAULT_SPACER_MM
                && !raw.config.contains_key("height") =>
            {
                warnings.push(format!("bloc '{}': hauteur absente, valeur par défaut", raw.id))
            }
            _ => {}
        }
    }
    warnings
}

/// Overall layout family for templates without blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    Report,
    Card,
    ArrestWarrant,
    Badge,
    CustomV2,
}

impl Default for LayoutType {
    fn default() -> Self {
        Self::Report
    }
}

/// Layout specification of a template.
///
/// Invariant: when `blocks` is non-empty, block-based rendering takes
/// precedence over `layout_type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default)]
    pub layout_type: LayoutType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_subtitle: Option<String>,
    #[serde(default)]
    pub show_logo: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<RawBlock>,
}

impl LayoutSettings {
    pub fn uses_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// A reusable document schema: ordered typed fields plus layout settings.
/// Owned by the administrative editor; updates never retroactively change
/// artifacts already rendered from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTemplate {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub min_clearance: i32,
    #[serde(default)]
    pub schema: Vec<TemplateField>,
    #[serde(default)]
    pub layout_settings: LayoutSettings,
}

impl DocumentTemplate {
    pub fn field(&self, id: &str) -> Option<&TemplateField> {
        self.schema.iter().find(|f| f.id == id)
    }

    /// Case-insensitive label lookup across the schema.
    pub fn field_by_label(&self, label: &str) -> Option<&TemplateField> {
        self.schema
            .iter()
            .find(|f| f.label.eq_ignore_ascii_case(label))
    }

    /// Save-time validation: schema ids must be unique, block configs sane.
    pub fn validate(&self) -> crate::Result<Vec<String>> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.schema {
            if field.id.is_empty() {
                return Err(crate::CoreError::InvalidTemplate(format!(
                    "champ sans identifiant dans '{}'",
                    self.name
                )));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(crate::CoreError::InvalidTemplate(format!(
                    "identifiant de champ dupliqué '{}'",
                    field.id
                )));
            }
        }
        Ok(validate_blocks(&self.layout_settings.blocks))
    }
}

//! Core model for the records office: document templates, registry records
//! and the store contract the export engine consumes.

pub mod record;
pub mod redaction;
pub mod store;
pub mod template;

pub use record::{
    Arrest, Civilian, Investigation, InvestigationLink, PenalCharge, RecordKind, Report,
};
pub use redaction::{RedactionVersion, VersionType};
pub use store::{RecordStore, Snapshot};
pub use template::{
    Block, ClassificationLevel, DocumentTemplate, FieldType, LayoutSettings, LayoutType, RawBlock,
    TemplateField,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("store error: {0}")]
    Store(String),
    #[error("unknown record: {0}")]
    UnknownRecord(String),
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}

/// Field values bound to a template at render time, keyed by field id.
pub type FieldValues = BTreeMap<String, serde_json::Value>;

/// A document instance bound to live record data. Built on demand for one
/// render call and discarded once the artifact exists; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundInstance {
    pub template: DocumentTemplate,
    pub values: FieldValues,
    /// Free-form narrative content carried by the record, if any.
    pub narrative: Option<String>,
    pub redacted_fields: BTreeSet<String>,
}

impl BoundInstance {
    pub fn new(template: DocumentTemplate, values: FieldValues) -> Self {
        Self {
            template,
            values,
            narrative: None,
            redacted_fields: BTreeSet::new(),
        }
    }

    pub fn with_narrative(mut self, narrative: Option<String>) -> Self {
        self.narrative = narrative;
        self
    }

    pub fn with_redactions(mut self, fields: BTreeSet<String>) -> Self {
        self.redacted_fields = fields;
        self
    }
}

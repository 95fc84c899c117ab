//! Store contract. The hosted backend is an opaque collaborator; the engine
//! only needs one batch read of every collection it archives.

use crate::record::{
    Arrest, Civilian, Investigation, InvestigationLink, PenalCharge, Report,
};
use crate::redaction::RedactionVersion;
use crate::template::DocumentTemplate;
use serde::{Deserialize, Serialize};

/// One consistent batch read of all archived collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub civilians: Vec<Civilian>,
    #[serde(default)]
    pub arrests: Vec<Arrest>,
    #[serde(default)]
    pub investigations: Vec<Investigation>,
    #[serde(default)]
    pub investigation_links: Vec<InvestigationLink>,
    #[serde(default)]
    pub templates: Vec<DocumentTemplate>,
    #[serde(default)]
    pub charges: Vec<PenalCharge>,
    #[serde(default)]
    pub redaction_versions: Vec<RedactionVersion>,
}

/// Read side of the data store. A failed snapshot is fatal to the job that
/// requested it; the engine never retries on its own.
pub trait RecordStore {
    fn snapshot(&self) -> crate::Result<Snapshot>;
}

impl Snapshot {
    pub fn charge_label(&self, id: &uuid::Uuid) -> Option<&str> {
        self.charges
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.label.as_str())
    }

    /// First template whose category matches, if any.
    pub fn template_for(&self, category: &str) -> Option<&DocumentTemplate> {
        self.templates
            .iter()
            .find(|t| t.category.eq_ignore_ascii_case(category))
    }
}

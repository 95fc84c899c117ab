//! Registry record types consumed by the export engine. The store owns the
//! query shapes; these are plain data carriers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level record families handled by the archival pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Report,
    Civilian,
    Arrest,
    Investigation,
}

impl RecordKind {
    /// Folder name inside the archive bundle.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Report => "Rapports",
            Self::Civilian => "Civils",
            Self::Arrest => "Arrestations",
            Self::Investigation => "Investigations",
        }
    }

    /// Slug used in single-export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Report => "rapport",
            Self::Civilian => "civil",
            Self::Arrest => "arrestation",
            Self::Investigation => "investigation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub officer: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form narrative body, possibly carrying editor markup.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Civilian {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub wanted: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Civilian {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrest {
    pub id: Uuid,
    pub suspect_name: String,
    pub officer: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub charge_ids: Vec<Uuid>,
    #[serde(default)]
    pub narrative: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigation {
    pub id: Uuid,
    pub case_number: String,
    pub title: String,
    pub lead_officer: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cross-reference from an investigation to another record. The pipeline
/// resolves these against artifacts it already produced, so a record linked
/// from several cases is rendered once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationLink {
    pub id: Uuid,
    pub investigation_id: Uuid,
    pub linked_kind: RecordKind,
    pub linked_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenalCharge {
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub article: Option<String>,
    #[serde(default)]
    pub fine: Option<u32>,
}

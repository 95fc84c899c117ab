//! Stored redaction version rows. Selection logic lives in the overlay
//! crate; these are the persisted shapes the store hands back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Visibility tier a stored version applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Full,
    Partial,
    Public,
}

/// A reusable set of fields to mask for one document at one tier. At most one
/// row per (document, tier) is meaningful; duplicates are a data-quality
/// condition consumers must tolerate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub version_type: VersionType,
    pub redacted_fields: BTreeSet<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

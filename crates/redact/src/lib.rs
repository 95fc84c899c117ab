//! Redaction overlay: named field-mask versions per document, selected by
//! viewer clearance. Independent of the template model; masks are applied by
//! the renderer through the redacted-field set alone.

use greffe_core::DocumentTemplate;
use std::collections::BTreeMap;
use uuid::Uuid;

pub use greffe_core::redaction::{RedactionVersion, VersionType};

/// Picks the version a viewer of the given clearance sees.
///
/// Clearance 4 and above reads the full document (`None`). Clearance 2–3
/// reads the partial version when one exists; there is deliberately no
/// fallback to another tier, absence means the full document. Clearance 0–1
/// reads the public version when one exists, likewise without fallback.
///
/// Duplicate rows for the same tier are a data-quality condition the
/// selection tolerates: the most recent row wins.
pub fn select_version<'a>(
    clearance: i32,
    versions: &'a [RedactionVersion],
) -> Option<&'a RedactionVersion> {
    let wanted = match clearance {
        c if c >= 4 => return None,
        2..=3 => VersionType::Partial,
        _ => VersionType::Public,
    };
    versions
        .iter()
        .filter(|v| v.version_type == wanted)
        .max_by_key(|v| v.created_at)
}

/// Flattens a checkbox-style redaction config into the concrete field-name
/// list stored on a version. Keys mapped to `false` are dropped; custom
/// free-form names are appended verbatim.
pub fn config_to_fields(config: &BTreeMap<String, bool>, custom: &[String]) -> Vec<String> {
    let mut fields: Vec<String> = config
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(name, _)| name.clone())
        .collect();
    fields.extend(custom.iter().cloned());
    fields
}

/// Save-time check of a version against the template it targets. Redacted
/// names are free-form strings for wire compatibility, so a field renamed in
/// the template silently stops matching; this surfaces those drifts as
/// warnings instead of letting them pass unnoticed.
pub fn check_binding(version: &RedactionVersion, template: &DocumentTemplate) -> Vec<String> {
    version
        .redacted_fields
        .iter()
        .filter(|name| template.field(name).is_none())
        .map(|name| {
            format!(
                "champ caviardé '{}' absent du schéma '{}'",
                name, template.name
            )
        })
        .collect()
}

/// Live-view resolution after a deletion: if the version a view was using no
/// longer exists, the view must fall back to the full (unredacted) document,
/// never to a stale cached field list.
pub fn resolve_active<'a>(
    current_id: Option<Uuid>,
    versions: &'a [RedactionVersion],
) -> Option<&'a RedactionVersion> {
    let id = current_id?;
    let found = versions.iter().find(|v| v.id == id);
    if found.is_none() {
        log::info!("redaction version {} deleted, falling back to full document", id);
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn version(t: VersionType, ts: i64) -> RedactionVersion {
        RedactionVersion {
            id: Uuid::new_v4(),
            document_id: Uuid::nil(),
            version_type: t,
            redacted_fields: BTreeSet::new(),
            created_by: "agent".into(),
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
        }
    }

    #[test]
    fn test_high_clearance_sees_full_document() {
        let versions = vec![version(VersionType::Partial, 1), version(VersionType::Public, 2)];
        assert!(select_version(5, &versions).is_none());
        assert!(select_version(4, &versions).is_none());
    }

    #[test]
    fn test_mid_clearance_never_falls_back_to_public() {
        let versions = vec![version(VersionType::Public, 1)];
        assert!(select_version(3, &versions).is_none());
        assert!(select_version(2, &versions).is_none());
    }

    #[test]
    fn test_low_clearance_selects_public() {
        let versions = vec![version(VersionType::Partial, 1), version(VersionType::Public, 2)];
        let picked = select_version(1, &versions).unwrap();
        assert_eq!(picked.version_type, VersionType::Public);
        let picked = select_version(0, &versions).unwrap();
        assert_eq!(picked.version_type, VersionType::Public);
    }

    #[test]
    fn test_duplicate_rows_most_recent_wins() {
        let old = version(VersionType::Partial, 10);
        let new = version(VersionType::Partial, 20);
        let new_id = new.id;
        let versions = vec![old, new];
        assert_eq!(select_version(2, &versions).unwrap().id, new_id);
    }

    #[test]
    fn test_config_to_fields() {
        let mut config = BTreeMap::new();
        config.insert("suspect_name".to_string(), true);
        config.insert("officer_name".to_string(), false);
        assert_eq!(config_to_fields(&config, &[]), vec!["suspect_name"]);
        assert!(config_to_fields(&BTreeMap::new(), &[]).is_empty());

        let custom = vec!["adresse_cachee".to_string()];
        assert_eq!(
            config_to_fields(&config, &custom),
            vec!["suspect_name", "adresse_cachee"]
        );
    }

    #[test]
    fn test_deleted_version_resolves_to_full() {
        let v = version(VersionType::Partial, 1);
        let id = v.id;
        assert!(resolve_active(Some(id), &[v.clone()]).is_some());
        // Version deleted mid-session: stale id resolves to the full view.
        assert!(resolve_active(Some(id), &[]).is_none());
        assert!(resolve_active(None, &[v]).is_none());
    }
}

//! Artifact and bundle naming. Names come from registry data typed by
//! humans, so everything is sanitized before it becomes a path segment.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Reduces a human name to a safe path segment: ASCII letters, digits,
/// dashes and underscores, accents folded where trivially possible. An empty
/// result falls back to `"document"`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = true;
    for c in name.chars().map(fold_accent) {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    let trimmed = out.trim_matches('_').to_string();
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'À' | 'Â' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Î' | 'Ï' => 'I',
        'Ô' | 'Ö' => 'O',
        'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

/// Truncated identifier used when a record has no usable human name.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Single-export file name: `YYYY_MM_DD_<kind>_<slug>.pdf`.
pub fn export_filename(date: DateTime<Utc>, kind_slug: &str, name: &str) -> String {
    format!("{}_{}_{}.pdf", date.format("%Y_%m_%d"), kind_slug, sanitize(name))
}

/// Deterministic, date-stamped bundle name.
pub fn archive_filename(date: DateTime<Utc>) -> String {
    format!("{}_archive_greffe.zip", date.format("%Y_%m_%d"))
}

//! Field value resolution: redaction mask first, then type-directed
//! formatting. Values never render as silent empty strings.

use crate::Locale;
use chrono::NaiveDate;
use greffe_core::{FieldType, FieldValues, TemplateField};
use serde_json::Value;
use std::collections::BTreeSet;

/// Literal marker substituted for every masked field, regardless of type.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Resolves one schema field against bound values and the redaction set.
pub fn resolve_value(
    field: &TemplateField,
    values: &FieldValues,
    redacted: &BTreeSet<String>,
    locale: Locale,
) -> String {
    if redacted.contains(&field.id) {
        return REDACTION_MARKER.to_string();
    }
    format_value(values.get(&field.id), field.field_type, locale)
}

/// Formats a raw value according to the declared field type.
pub fn format_value(value: Option<&Value>, field_type: FieldType, locale: Locale) -> String {
    let value = match value {
        Some(Value::Null) | None => return locale.empty_placeholder().to_string(),
        Some(v) => v,
    };
    match field_type {
        FieldType::Boolean => match as_bool(value) {
            Some(true) => locale.yes().to_string(),
            Some(false) => locale.no().to_string(),
            None => locale.empty_placeholder().to_string(),
        },
        FieldType::Date => match value.as_str() {
            Some(s) => format_date(s, locale),
            None => locale.empty_placeholder().to_string(),
        },
        _ => match value {
            Value::String(s) if s.trim().is_empty() => locale.empty_placeholder().to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => {
                if *b {
                    locale.yes().to_string()
                } else {
                    locale.no().to_string()
                }
            }
            other => other.to_string(),
        },
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "oui" | "yes" | "1" => Some(true),
            "false" | "non" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

/// ISO dates reformat to the locale's date format; anything unparseable
/// passes through verbatim rather than disappearing.
fn format_date(raw: &str, locale: Locale) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return locale.empty_placeholder().to_string();
    }
    let head = raw.get(..10).unwrap_or(raw);
    match NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        Ok(date) => date.format(locale.date_format()).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Dual lookup used by `fields`-type blocks: a case-insensitive label match
/// against the schema first, then the label itself as a raw key into the
/// bound values. Compatibility shim for templates authored before labels and
/// ids were separated; preserved deliberately.
pub fn value_by_label(
    template: &greffe_core::DocumentTemplate,
    label: &str,
    values: &FieldValues,
    redacted: &BTreeSet<String>,
    locale: Locale,
) -> String {
    if let Some(field) = template.field_by_label(label) {
        return resolve_value(field, values, redacted, locale);
    }
    if redacted.contains(label) {
        return REDACTION_MARKER.to_string();
    }
    format_value(values.get(label), FieldType::Text, locale)
}

/// Strips editor markup from narrative content, keeping text and paragraph
/// breaks. The rich-text editor itself is an external collaborator.
pub fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                in_tag = true;
                // Block-level closers become paragraph breaks.
                let rest: String = chars.clone().take(4).collect();
                let lower = rest.to_lowercase();
                if lower.starts_with("/p>") || lower.starts_with("br>") || lower.starts_with("br/")
                {
                    out.push('\n');
                }
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    decode_entities(out.trim().to_string())
}

fn decode_entities(text: String) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use greffe_core::{DocumentTemplate, LayoutSettings};
    use serde_json::json;
    use uuid::Uuid;

    fn values(pairs: &[(&str, Value)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn field(id: &str, field_type: FieldType) -> TemplateField {
        TemplateField::new(id, id, field_type)
    }

    #[test]
    fn test_redacted_wins_over_type() {
        let vals = values(&[("b", json!(true))]);
        let redacted: BTreeSet<String> = ["b".to_string()].into();
        let out = resolve_value(&field("b", FieldType::Boolean), &vals, &redacted, Locale::Fr);
        assert_eq!(out, REDACTION_MARKER);
    }

    #[test]
    fn test_scenario_three_fields_one_masked() {
        let vals = values(&[
            ("a", json!("John")),
            ("b", json!(true)),
            ("c", json!("2024-01-05")),
        ]);
        let redacted: BTreeSet<String> = ["b".to_string()].into();
        let locale = Locale::Fr;
        assert_eq!(
            resolve_value(&field("a", FieldType::Text), &vals, &redacted, locale),
            "John"
        );
        assert_eq!(
            resolve_value(&field("b", FieldType::Boolean), &vals, &redacted, locale),
            REDACTION_MARKER
        );
        assert_eq!(
            resolve_value(&field("c", FieldType::Date), &vals, &redacted, locale),
            "05/01/2024"
        );
    }

    #[test]
    fn test_boolean_localized() {
        let vals = values(&[("b", json!(false))]);
        let none = BTreeSet::new();
        assert_eq!(
            resolve_value(&field("b", FieldType::Boolean), &vals, &none, Locale::Fr),
            "Non"
        );
        assert_eq!(
            resolve_value(&field("b", FieldType::Boolean), &vals, &none, Locale::En),
            "No"
        );
    }

    #[test]
    fn test_missing_value_uses_placeholder() {
        let none = BTreeSet::new();
        let out = resolve_value(&field("x", FieldType::Text), &FieldValues::new(), &none, Locale::Fr);
        assert_eq!(out, Locale::Fr.empty_placeholder());
        let out = format_value(Some(&json!("   ")), FieldType::Text, Locale::Fr);
        assert_eq!(out, Locale::Fr.empty_placeholder());
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        assert_eq!(
            format_value(Some(&json!("hier soir")), FieldType::Date, Locale::Fr),
            "hier soir"
        );
    }

    #[test]
    fn test_value_by_label_dual_lookup() {
        let template = DocumentTemplate {
            id: Uuid::nil(),
            name: "T".into(),
            category: "rapport".into(),
            min_clearance: 0,
            schema: vec![TemplateField::new("suspect_name", "Nom du suspect", FieldType::Text)],
            layout_settings: LayoutSettings::default(),
        };
        let vals = values(&[("suspect_name", json!("Doe")), ("Lieu", json!("Quartier Nord"))]);
        let none = BTreeSet::new();
        // Schema label match, case-insensitive.
        assert_eq!(
            value_by_label(&template, "NOM DU SUSPECT", &vals, &none, Locale::Fr),
            "Doe"
        );
        // Raw-key fallback when the label is not in the schema.
        assert_eq!(
            value_by_label(&template, "Lieu", &vals, &none, Locale::Fr),
            "Quartier Nord"
        );
    }

    #[test]
    fn test_strip_markup() {
        let raw = "<p>Premier &amp; second</p><p>Suite<br>fin</p>";
        assert_eq!(strip_markup(raw), "Premier & second\nSuite\nfin");
        assert_eq!(strip_markup("sans balises"), "sans balises");
    }
}

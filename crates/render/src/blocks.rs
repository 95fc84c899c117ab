//! Block-based (v2) layout rendering. Each stored block maps to one rule;
//! malformed blocks degrade to placeholders and unknown types render empty so
//! a template saved by a newer or older editor still produces a document.

use crate::tree::{classification_color, FieldRow, Node};
use crate::value::{strip_markup, value_by_label, REDACTION_MARKER};
use crate::{Locale, RenderContext};
use greffe_core::{Block, DocumentTemplate, FieldValues, RawBlock, TemplateField};
use std::collections::BTreeSet;

/// Built-in notice used when a warning block has no text configured.
const DEFAULT_WARNING_FR: &str = "Document officiel. Toute diffusion non autorisée \
expose son auteur à des poursuites disciplinaires et pénales.";
const DEFAULT_WARNING_EN: &str = "Official document. Unauthorized distribution is \
subject to disciplinary and criminal proceedings.";

pub(crate) fn render_blocks(
    template: &DocumentTemplate,
    values: &FieldValues,
    narrative: Option<&str>,
    redacted: &BTreeSet<String>,
    ctx: &RenderContext,
) -> Vec<Node> {
    template
        .layout_settings
        .blocks
        .iter()
        .map(|raw| render_one(template, raw, values, narrative, redacted, ctx))
        .collect()
}

fn render_one(
    template: &DocumentTemplate,
    raw: &RawBlock,
    values: &FieldValues,
    narrative: Option<&str>,
    redacted: &BTreeSet<String>,
    ctx: &RenderContext,
) -> Node {
    match Block::from_raw(raw) {
        Block::Classification { level } => Node::Banner {
            text: level.label().to_string(),
            color: classification_color(level),
        },
        Block::Header { show_seal } => {
            let layout = &template.layout_settings;
            Node::Header {
                title: layout
                    .header_title
                    .clone()
                    .unwrap_or_else(|| template.name.clone()),
                subtitle: layout.header_subtitle.clone(),
                show_seal,
                reference: ctx.reference.clone(),
                date: ctx.date_string(),
            }
        }
        Block::Warning { text } => Node::Notice {
            text: text.unwrap_or_else(|| default_warning(ctx.locale).to_string()),
        },
        Block::Personnel => Node::Identity {
            rows: vec![
                (personnel_label(ctx.locale, 0), ctx.author.name.clone()),
                (personnel_label(ctx.locale, 1), ctx.author.badge.clone()),
            ],
        },
        Block::Suspect { fields } | Block::Fields { fields } => {
            if fields.is_empty() {
                log::warn!("block '{}' has no fields, rendering placeholder", raw.id);
                return Node::Placeholder;
            }
            Node::FieldTable {
                title: raw.title.clone(),
                rows: field_rows(template, &fields, values, redacted, ctx.locale),
            }
        }
        Block::Narrative => Node::Narrative {
            title: raw.title.clone(),
            text: narrative
                .map(strip_markup)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| ctx.locale.empty_placeholder().to_string()),
        },
        Block::Signature => Node::Signature {
            name: ctx.author.name.clone(),
            badge: ctx.author.badge.clone(),
            specialty: ctx.author.specialty.clone(),
        },
        Block::Spacer { height_mm } => Node::Spacer { height_mm },
        // Reserved block types for deployments that configure them.
        Block::Footer | Block::Vehicle | Block::Evidence => Node::Placeholder,
        Block::Unknown => Node::Placeholder,
    }
}

fn default_warning(locale: Locale) -> &'static str {
    match locale {
        Locale::Fr => DEFAULT_WARNING_FR,
        Locale::En => DEFAULT_WARNING_EN,
    }
}

fn personnel_label(locale: Locale, row: usize) -> String {
    match (locale, row) {
        (Locale::Fr, 0) => "Agent".to_string(),
        (Locale::Fr, _) => "Matricule".to_string(),
        (Locale::En, 0) => "Officer".to_string(),
        (Locale::En, _) => "Badge".to_string(),
    }
}

fn field_rows(
    template: &DocumentTemplate,
    fields: &[TemplateField],
    values: &FieldValues,
    redacted: &BTreeSet<String>,
    locale: Locale,
) -> Vec<FieldRow> {
    fields
        .iter()
        .map(|f| {
            // The mask decision drives the value too: a row flagged redacted
            // must never carry the true value, whichever name matched.
            let masked = is_masked(template, f, redacted);
            let value = if masked {
                REDACTION_MARKER.to_string()
            } else {
                value_by_label(template, &f.label, values, redacted, locale)
            };
            FieldRow {
                label: f.label.clone(),
                value,
                redacted: masked,
            }
        })
        .collect()
}

fn is_masked(template: &DocumentTemplate, field: &TemplateField, redacted: &BTreeSet<String>) -> bool {
    if redacted.contains(&field.id) || redacted.contains(&field.label) {
        return true;
    }
    template
        .field_by_label(&field.label)
        .map(|f| redacted.contains(&f.id))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_ctx;
    use crate::{render, Color};
    use greffe_core::{ClassificationLevel, FieldType, LayoutSettings};
    use serde_json::json;
    use uuid::Uuid;

    fn raw_block(block_type: &str, config: serde_json::Value) -> RawBlock {
        RawBlock {
            id: format!("b-{block_type}"),
            block_type: block_type.to_string(),
            title: None,
            config: config.as_object().cloned().unwrap_or_default(),
            fields: Vec::new(),
        }
    }

    fn block_template(blocks: Vec<RawBlock>) -> DocumentTemplate {
        DocumentTemplate {
            id: Uuid::nil(),
            name: "Mandat".into(),
            category: "mandat".into(),
            min_clearance: 3,
            schema: vec![TemplateField::new("suspect_name", "Nom du suspect", FieldType::Text)],
            layout_settings: LayoutSettings {
                blocks,
                ..LayoutSettings::default()
            },
        }
    }

    #[test]
    fn test_blocks_take_precedence_over_layout_type() {
        let template = block_template(vec![raw_block("signature", json!({}))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        assert_eq!(tree.nodes.len(), 1);
        assert!(matches!(tree.nodes[0], Node::Signature { .. }));
    }

    #[test]
    fn test_block_order_is_stored_order() {
        let template = block_template(vec![
            raw_block("classification", json!({ "level": "secret" })),
            raw_block("header", json!({})),
            raw_block("warning", json!({})),
            raw_block("personnel", json!({})),
            raw_block("spacer", json!({ "height": 12.0 })),
            raw_block("signature", json!({})),
        ]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        assert!(matches!(tree.nodes[0], Node::Banner { .. }));
        assert!(matches!(tree.nodes[1], Node::Header { .. }));
        assert!(matches!(tree.nodes[2], Node::Notice { .. }));
        assert!(matches!(tree.nodes[3], Node::Identity { .. }));
        assert!(matches!(tree.nodes[4], Node::Spacer { height_mm } if height_mm == 12.0));
        assert!(matches!(tree.nodes[5], Node::Signature { .. }));
    }

    #[test]
    fn test_classification_banner_palette() {
        let template = block_template(vec![raw_block("classification", json!({ "level": "secret" }))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        match &tree.nodes[0] {
            Node::Banner { text, color } => {
                assert_eq!(text, "SECRET");
                assert_eq!(*color, classification_color(ClassificationLevel::Secret));
            }
            other => panic!("expected banner, got {other:?}"),
        }

        // Unrecognized level gets the neutral color, not a failure.
        let template = block_template(vec![raw_block("classification", json!({ "level": "violet" }))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        match &tree.nodes[0] {
            Node::Banner { color, .. } => {
                assert_eq!(*color, Color([75, 85, 99]));
            }
            other => panic!("expected banner, got {other:?}"),
        }
    }

    #[test]
    fn test_warning_block_default_text() {
        let template = block_template(vec![raw_block("warning", json!({}))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        match &tree.nodes[0] {
            Node::Notice { text } => assert_eq!(text, DEFAULT_WARNING_FR),
            other => panic!("expected notice, got {other:?}"),
        }

        let template = block_template(vec![raw_block("warning", json!({ "text": "Accès restreint" }))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        match &tree.nodes[0] {
            Node::Notice { text } => assert_eq!(text, "Accès restreint"),
            other => panic!("expected notice, got {other:?}"),
        }
    }

    #[test]
    fn test_fields_block_resolves_through_schema_and_raw_keys() {
        let mut block = raw_block("fields", json!({}));
        block.fields = vec![
            TemplateField::new("f1", "Nom du suspect", FieldType::Text),
            TemplateField::new("f2", "Secteur", FieldType::Text),
        ];
        let template = block_template(vec![block]);
        let values: FieldValues = [
            ("suspect_name".to_string(), json!("Doe")),
            ("Secteur".to_string(), json!("Nord")),
        ]
        .into();
        let redacted: BTreeSet<String> = ["suspect_name".to_string()].into();
        let tree = render(&template, &values, None, &redacted, &test_ctx());
        let rows: Vec<_> = tree.field_rows().collect();
        // Schema-backed label is masked through the schema field id.
        assert_eq!(rows[0].value, crate::REDACTION_MARKER);
        assert!(rows[0].redacted);
        // Raw-key fallback still resolves.
        assert_eq!(rows[1].value, "Nord");
    }

    #[test]
    fn test_masked_block_field_id_never_shows_value() {
        // Redaction by the block-local field id, resolved value coming from
        // a raw-key lookup: the row must mask, not just flag.
        let mut block = raw_block("fields", json!({}));
        block.fields = vec![TemplateField::new("f1", "Indicateur", FieldType::Text)];
        let template = block_template(vec![block]);
        let values: FieldValues =
            [("Indicateur".to_string(), json!("NOM-CONFIDENTIEL"))].into();
        let redacted: BTreeSet<String> = ["f1".to_string()].into();
        let tree = render(&template, &values, None, &redacted, &test_ctx());
        let rows: Vec<_> = tree.field_rows().collect();
        assert!(rows[0].redacted);
        assert_eq!(rows[0].value, crate::REDACTION_MARKER);
    }

    #[test]
    fn test_unknown_and_reserved_blocks_render_empty() {
        let template = block_template(vec![
            raw_block("hologram", json!({})),
            raw_block("vehicle", json!({})),
            raw_block("evidence", json!({})),
            raw_block("footer", json!({})),
            raw_block("signature", json!({})),
        ]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        // A run of unimplemented blocks never prevents the rest from rendering.
        assert_eq!(tree.nodes.len(), 5);
        assert!(tree.nodes[..4].iter().all(|n| matches!(n, Node::Placeholder)));
        assert!(matches!(tree.nodes[4], Node::Signature { .. }));
    }

    #[test]
    fn test_malformed_fields_block_degrades() {
        let template = block_template(vec![raw_block("fields", json!({}))]);
        let tree = render(&template, &FieldValues::new(), None, &BTreeSet::new(), &test_ctx());
        assert_eq!(tree.nodes, vec![Node::Placeholder]);
    }

    #[test]
    fn test_narrative_block_uses_record_content() {
        let template = block_template(vec![raw_block("narrative", json!({}))]);
        let tree = render(
            &template,
            &FieldValues::new(),
            Some("<p>Patrouille sans incident.</p>"),
            &BTreeSet::new(),
            &test_ctx(),
        );
        match &tree.nodes[0] {
            Node::Narrative { text, .. } => assert_eq!(text, "Patrouille sans incident."),
            other => panic!("expected narrative, got {other:?}"),
        }
    }
}

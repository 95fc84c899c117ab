//! Binding: turns one registry record into a bound document instance, using
//! the template stored for its category or a built-in default layout. The
//! instance exists for one render call only.

use greffe_core::{
    Arrest, BoundInstance, Civilian, DocumentTemplate, FieldType, FieldValues, Investigation,
    LayoutSettings, LayoutType, RawBlock, RecordKind, Report, Snapshot, TemplateField,
};
use serde_json::{json, Value};
use uuid::Uuid;

/// A record bound for rendering plus the naming material the pipeline needs.
pub struct BoundRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub display_name: String,
    pub instance: BoundInstance,
}

fn raw_block(block_type: &str, config: Value) -> RawBlock {
    RawBlock {
        id: format!("default-{block_type}"),
        block_type: block_type.to_string(),
        title: None,
        config: config.as_object().cloned().unwrap_or_default(),
        fields: Vec::new(),
    }
}

fn schema_field(id: &str, label: &str, field_type: FieldType) -> TemplateField {
    TemplateField::new(id, label, field_type)
}

/// Built-in fallback template for a record kind, used when the store has no
/// template for the category.
pub fn default_template(kind: RecordKind) -> DocumentTemplate {
    let (name, category, schema, blocks) = match kind {
        RecordKind::Report => (
            "Rapport d'intervention",
            "rapport",
            vec![
                schema_field("title", "Objet", FieldType::Text),
                schema_field("officer", "Agent rédacteur", FieldType::Text),
                schema_field("category", "Catégorie", FieldType::Text),
                schema_field("date", "Date", FieldType::Date),
            ],
            Vec::new(),
        ),
        RecordKind::Civilian => (
            "Fiche civile",
            "civil",
            vec![
                schema_field("last_name", "Nom", FieldType::Text),
                schema_field("first_name", "Prénom", FieldType::Text),
                schema_field("date_of_birth", "Date de naissance", FieldType::Date),
                schema_field("phone", "Téléphone", FieldType::Text),
                schema_field("address", "Adresse", FieldType::Text),
                schema_field("wanted", "Recherché", FieldType::Boolean),
            ],
            Vec::new(),
        ),
        RecordKind::Arrest => (
            "Procès-verbal d'arrestation",
            "arrestation",
            vec![
                schema_field("suspect_name", "Nom du suspect", FieldType::Text),
                schema_field("officer", "Agent interpellateur", FieldType::Text),
                schema_field("location", "Lieu", FieldType::Text),
                schema_field("charges", "Chefs d'accusation", FieldType::Textarea),
                schema_field("date", "Date", FieldType::Date),
            ],
            vec![
                raw_block("classification", json!({ "level": "restricted" })),
                raw_block("header", json!({})),
                raw_block("warning", json!({})),
                raw_block("personnel", json!({})),
                suspect_block(),
                raw_block("narrative", json!({})),
                raw_block("signature", json!({})),
            ],
        ),
        RecordKind::Investigation => (
            "Dossier d'investigation",
            "investigation",
            vec![
                schema_field("case_number", "Numéro de dossier", FieldType::Text),
                schema_field("title", "Intitulé", FieldType::Text),
                schema_field("lead_officer", "Enquêteur principal", FieldType::Text),
                schema_field("status", "Statut", FieldType::Text),
                schema_field("date", "Ouvert le", FieldType::Date),
            ],
            Vec::new(),
        ),
    };
    DocumentTemplate {
        id: Uuid::nil(),
        name: name.to_string(),
        category: category.to_string(),
        min_clearance: 0,
        schema,
        layout_settings: LayoutSettings {
            layout_type: LayoutType::Report,
            show_logo: true,
            footer_text: Some("Greffe central — document généré automatiquement".to_string()),
            blocks,
            ..LayoutSettings::default()
        },
    }
}

fn suspect_block() -> RawBlock {
    let mut block = raw_block("suspect", json!({}));
    block.title = Some("Identité du suspect".to_string());
    block.fields = vec![
        schema_field("suspect_name", "Nom du suspect", FieldType::Text),
        schema_field("location", "Lieu", FieldType::Text),
        schema_field("charges", "Chefs d'accusation", FieldType::Textarea),
    ];
    block
}

fn template_or_default(snap: &Snapshot, kind: RecordKind) -> DocumentTemplate {
    snap.template_for(kind.slug())
        .cloned()
        .unwrap_or_else(|| default_template(kind))
}

pub fn bind_report(snap: &Snapshot, report: &Report) -> BoundRecord {
    let mut values = FieldValues::new();
    values.insert("title".into(), json!(report.title));
    values.insert("officer".into(), json!(report.officer));
    if let Some(cat) = &report.category {
        values.insert("category".into(), json!(cat));
    }
    values.insert("date".into(), json!(report.created_at.date_naive().to_string()));

    let template = report
        .template_id
        .and_then(|id| snap.templates.iter().find(|t| t.id == id).cloned())
        .unwrap_or_else(|| template_or_default(snap, RecordKind::Report));

    BoundRecord {
        id: report.id,
        kind: RecordKind::Report,
        display_name: report.title.clone(),
        instance: BoundInstance::new(template, values).with_narrative(report.content.clone()),
    }
}

pub fn bind_civilian(snap: &Snapshot, civilian: &Civilian) -> BoundRecord {
    let mut values = FieldValues::new();
    values.insert("last_name".into(), json!(civilian.last_name));
    values.insert("first_name".into(), json!(civilian.first_name));
    if let Some(dob) = civilian.date_of_birth {
        values.insert("date_of_birth".into(), json!(dob.to_string()));
    }
    if let Some(phone) = &civilian.phone {
        values.insert("phone".into(), json!(phone));
    }
    if let Some(address) = &civilian.address {
        values.insert("address".into(), json!(address));
    }
    values.insert("wanted".into(), json!(civilian.wanted));

    BoundRecord {
        id: civilian.id,
        kind: RecordKind::Civilian,
        display_name: civilian.full_name(),
        instance: BoundInstance::new(template_or_default(snap, RecordKind::Civilian), values)
            .with_narrative(civilian.notes.clone()),
    }
}

pub fn bind_arrest(snap: &Snapshot, arrest: &Arrest) -> BoundRecord {
    let charges: Vec<&str> = arrest
        .charge_ids
        .iter()
        .filter_map(|id| snap.charge_label(id))
        .collect();
    let mut values = FieldValues::new();
    values.insert("suspect_name".into(), json!(arrest.suspect_name));
    values.insert("officer".into(), json!(arrest.officer));
    if let Some(location) = &arrest.location {
        values.insert("location".into(), json!(location));
    }
    if !charges.is_empty() {
        values.insert("charges".into(), json!(charges.join(", ")));
    }
    values.insert("date".into(), json!(arrest.created_at.date_naive().to_string()));

    BoundRecord {
        id: arrest.id,
        kind: RecordKind::Arrest,
        display_name: arrest.suspect_name.clone(),
        instance: BoundInstance::new(template_or_default(snap, RecordKind::Arrest), values)
            .with_narrative(arrest.narrative.clone()),
    }
}

pub fn bind_investigation(snap: &Snapshot, investigation: &Investigation) -> BoundRecord {
    let mut values = FieldValues::new();
    values.insert("case_number".into(), json!(investigation.case_number));
    values.insert("title".into(), json!(investigation.title));
    values.insert("lead_officer".into(), json!(investigation.lead_officer));
    if let Some(status) = &investigation.status {
        values.insert("status".into(), json!(status));
    }
    values.insert(
        "date".into(),
        json!(investigation.created_at.date_naive().to_string()),
    );

    BoundRecord {
        id: investigation.id,
        kind: RecordKind::Investigation,
        display_name: investigation.case_number.clone(),
        instance: BoundInstance::new(template_or_default(snap, RecordKind::Investigation), values)
            .with_narrative(investigation.summary.clone()),
    }
}

/// Binds any record of the snapshot by kind and id.
pub fn bind(snap: &Snapshot, kind: RecordKind, id: Uuid) -> Option<BoundRecord> {
    match kind {
        RecordKind::Report => snap
            .reports
            .iter()
            .find(|r| r.id == id)
            .map(|r| bind_report(snap, r)),
        RecordKind::Civilian => snap
            .civilians
            .iter()
            .find(|c| c.id == id)
            .map(|c| bind_civilian(snap, c)),
        RecordKind::Arrest => snap
            .arrests
            .iter()
            .find(|a| a.id == id)
            .map(|a| bind_arrest(snap, a)),
        RecordKind::Investigation => snap
            .investigations
            .iter()
            .find(|i| i.id == id)
            .map(|i| bind_investigation(snap, i)),
    }
}

/// Credential-issuance (access) document: card layout over civilian identity.
pub fn bind_access(civilian: &Civilian) -> BoundRecord {
    let template = DocumentTemplate {
        id: Uuid::nil(),
        name: "Titre d'accès".to_string(),
        category: "acces".to_string(),
        min_clearance: 0,
        schema: vec![
            schema_field("holder", "Titulaire", FieldType::Text),
            schema_field("date_of_birth", "Date de naissance", FieldType::Date),
            schema_field("issued", "Délivré le", FieldType::Date),
        ],
        layout_settings: LayoutSettings {
            layout_type: LayoutType::Card,
            header_title: Some("Titre d'accès".to_string()),
            show_logo: true,
            ..LayoutSettings::default()
        },
    };
    let mut values = FieldValues::new();
    values.insert("holder".into(), json!(civilian.full_name()));
    if let Some(dob) = civilian.date_of_birth {
        values.insert("date_of_birth".into(), json!(dob.to_string()));
    }
    BoundRecord {
        id: civilian.id,
        kind: RecordKind::Civilian,
        display_name: civilian.full_name(),
        instance: BoundInstance::new(template, values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use greffe_core::PenalCharge;

    #[test]
    fn test_arrest_binding_joins_charge_labels() {
        let charge = PenalCharge {
            id: Uuid::new_v4(),
            label: "Vol aggravé".into(),
            article: Some("311-4".into()),
            fine: Some(750),
        };
        let arrest = Arrest {
            id: Uuid::new_v4(),
            suspect_name: "J. Doe".into(),
            officer: "Cpt. Dumont".into(),
            location: Some("Secteur 4".into()),
            charge_ids: vec![charge.id, Uuid::new_v4()],
            narrative: None,
            created_at: Utc::now(),
        };
        let snap = Snapshot {
            charges: vec![charge],
            ..Snapshot::default()
        };
        let bound = bind_arrest(&snap, &arrest);
        // Unknown charge ids are skipped, known ones joined.
        assert_eq!(bound.instance.values["charges"], json!("Vol aggravé"));
        assert!(bound.instance.template.layout_settings.uses_blocks());
    }

    #[test]
    fn test_default_templates_validate() {
        for kind in [
            RecordKind::Report,
            RecordKind::Civilian,
            RecordKind::Arrest,
            RecordKind::Investigation,
        ] {
            let template = default_template(kind);
            let warnings = template.validate().unwrap();
            assert!(warnings.is_empty(), "{kind:?}: {warnings:?}");
        }
    }

    #[test]
    fn test_bind_unknown_id_is_none() {
        assert!(bind(&Snapshot::default(), RecordKind::Report, Uuid::new_v4()).is_none());
    }
}

//! Batch archival pipeline. Iterates every record collection, renders each
//! record through the composition engine and assembles the artifacts into
//! one compressed, folder-structured bundle with a manifest.

pub mod bind;
mod backup;
pub mod naming;

pub use backup::{
    export_single, run_access_batch, run_backup, BackupOptions, BackupOutcome, CancelToken,
    FailureNote, JobPhase, SingleExport,
};

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Initial data fetch failed or a requested record does not exist; the
    /// job aborts with no partial output.
    #[error("job fatal: {0}")]
    Fatal(String),
    #[error("job cancelled")]
    Cancelled,
    #[error(transparent)]
    Raster(#[from] greffe_raster::RasterError),
    #[error(transparent)]
    Pdf(#[from] greffe_pdf::PdfError),
    #[error("bundle write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use greffe_core::{
        Arrest, Civilian, CoreError, Investigation, InvestigationLink, RecordKind, RecordStore,
        Report, Snapshot,
    };
    use greffe_render::{Author, Locale};
    use std::io::Read;
    use uuid::Uuid;
    use zip::ZipArchive;

    struct MemStore(Snapshot);

    impl RecordStore for MemStore {
        fn snapshot(&self) -> greffe_core::Result<Snapshot> {
            Ok(self.0.clone())
        }
    }

    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn snapshot(&self) -> greffe_core::Result<Snapshot> {
            Err(CoreError::Store("backend injoignable".into()))
        }
    }

    fn operator() -> Author {
        Author {
            name: "Lt. Verne".into(),
            badge: "B-0231".into(),
            specialty: None,
        }
    }

    fn opts() -> BackupOptions {
        BackupOptions {
            operator: operator(),
            locale: Locale::Fr,
            // Small pages keep the test rasters cheap.
            page: greffe_raster::PageGeometry {
                width_mm: 105.0,
                height_mm: 148.0,
                margin_mm: 8.0,
                scale: 1.0,
            },
            now: chrono::DateTime::parse_from_rfc3339("2026-03-02T09:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn report(title: &str) -> Report {
        Report {
            id: Uuid::new_v4(),
            title: title.into(),
            officer: "Lt. Verne".into(),
            category: Some("patrouille".into()),
            content: Some("<p>Rien à signaler.</p>".into()),
            template_id: None,
            created_at: Utc::now(),
        }
    }

    fn snapshot_with_links() -> (Snapshot, Uuid) {
        let linked = report("Rapport lié");
        let linked_id = linked.id;
        let investigation = Investigation {
            id: Uuid::new_v4(),
            case_number: "INV-2026-001".into(),
            title: "Filature".into(),
            lead_officer: "Cpt. Dumont".into(),
            status: Some("ouvert".into()),
            summary: None,
            created_at: Utc::now(),
        };
        let links = vec![
            InvestigationLink {
                id: Uuid::new_v4(),
                investigation_id: investigation.id,
                linked_kind: RecordKind::Report,
                linked_id,
            },
            InvestigationLink {
                id: Uuid::new_v4(),
                investigation_id: investigation.id,
                linked_kind: RecordKind::Report,
                linked_id,
            },
        ];
        let snap = Snapshot {
            reports: vec![linked],
            civilians: vec![Civilian {
                id: Uuid::new_v4(),
                first_name: "Ana".into(),
                last_name: "Mercier".into(),
                date_of_birth: None,
                phone: None,
                address: Some("12 rue Basse".into()),
                wanted: false,
                notes: None,
                created_at: Utc::now(),
            }],
            arrests: vec![Arrest {
                id: Uuid::new_v4(),
                suspect_name: "J. Doe".into(),
                officer: "Lt. Verne".into(),
                location: Some("Secteur 4".into()),
                charge_ids: vec![],
                narrative: Some("Interpellation sans incident.".into()),
                created_at: Utc::now(),
            }],
            investigations: vec![investigation],
            investigation_links: links,
            ..Snapshot::default()
        };
        (snap, linked_id)
    }

    fn names_of(bytes: &[u8]) -> Vec<String> {
        let mut zip = ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_backup_produces_folder_structured_bundle() {
        let (snap, _) = snapshot_with_links();
        let store = MemStore(snap);
        let mut statuses = Vec::new();
        let outcome = run_backup(&store, &opts(), &CancelToken::new(), &mut |s: &str| {
            statuses.push(s.to_string())
        })
        .unwrap();

        assert_eq!(outcome.archive_name, "2026_03_02_archive_greffe.zip");
        // 4 records rendered once each, links are references.
        assert_eq!(outcome.rendered, 4);
        assert!(outcome.failures.is_empty());
        assert!(statuses.first().unwrap().contains("Récupération"));
        assert!(statuses.iter().any(|s| s.contains("Rapports 1/1")));

        let names = names_of(&outcome.bytes);
        assert!(names.iter().any(|n| n.starts_with("Rapports/")));
        assert!(names.iter().any(|n| n == "Civils/Ana_Mercier.pdf"));
        assert!(names.iter().any(|n| n.starts_with("Arrestations/")));
        assert!(names.iter().any(|n| n == "Investigations/INV-2026-001/dossier.pdf"));
        assert!(names.contains(&"manifeste.json".to_string()));
    }

    #[test]
    fn test_linked_report_rendered_once_referenced_twice() {
        let (snap, linked_id) = snapshot_with_links();
        let store = MemStore(snap);
        let outcome = run_backup(&store, &opts(), &CancelToken::new(), &mut |_| {}).unwrap();

        let names = names_of(&outcome.bytes);
        let stem = naming::short_id(&linked_id);
        let in_reports = names
            .iter()
            .filter(|n| n.starts_with("Rapports/") && n.contains(&stem))
            .count();
        let in_investigation = names
            .iter()
            .filter(|n| n.starts_with("Investigations/INV-2026-001/") && n.contains(&stem))
            .count();
        assert_eq!(in_reports, 1);
        // Two links to the same report: two references in the case folder.
        assert_eq!(in_investigation, 2);

        // The referenced bytes are identical to the rendered artifact.
        let mut zip = ZipArchive::new(std::io::Cursor::new(&outcome.bytes[..])).unwrap();
        let mut rendered = Vec::new();
        zip.by_name(&format!("Rapports/{stem}_Rapport_lie.pdf"))
            .unwrap()
            .read_to_end(&mut rendered)
            .unwrap();
        let mut referenced = Vec::new();
        zip.by_name(&format!("Investigations/INV-2026-001/rapport_{stem}.pdf"))
            .unwrap()
            .read_to_end(&mut referenced)
            .unwrap();
        assert_eq!(rendered, referenced);
        let mut second = Vec::new();
        zip.by_name(&format!("Investigations/INV-2026-001/rapport_{stem}_2.pdf"))
            .unwrap()
            .read_to_end(&mut second)
            .unwrap();
        assert_eq!(rendered, second);
    }

    #[test]
    fn test_homonym_civilians_both_archived() {
        let (mut snap, _) = snapshot_with_links();
        // Same display name, distinct records: both must land in the bundle.
        let twin = Civilian {
            id: Uuid::new_v4(),
            ..snap.civilians[0].clone()
        };
        snap.civilians.push(twin);
        let store = MemStore(snap);
        let outcome = run_backup(&store, &opts(), &CancelToken::new(), &mut |_| {}).unwrap();
        assert_eq!(outcome.rendered, 5);
        assert!(outcome.failures.is_empty());

        let names = names_of(&outcome.bytes);
        assert!(names.iter().any(|n| n == "Civils/Ana_Mercier.pdf"));
        assert!(names.iter().any(|n| n == "Civils/Ana_Mercier_2.pdf"));
    }

    #[test]
    fn test_dangling_link_noted_in_manifest() {
        let (mut snap, _) = snapshot_with_links();
        snap.investigation_links.push(InvestigationLink {
            id: Uuid::new_v4(),
            investigation_id: snap.investigations[0].id,
            linked_kind: RecordKind::Arrest,
            linked_id: Uuid::new_v4(),
        });
        let store = MemStore(snap);
        let outcome = run_backup(&store, &opts(), &CancelToken::new(), &mut |_| {}).unwrap();
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, RecordKind::Arrest);
    }

    #[test]
    fn test_fetch_failure_is_fatal_with_no_archive() {
        let err = run_backup(&BrokenStore, &opts(), &CancelToken::new(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, ArchiveError::Fatal(_)));
    }

    #[test]
    fn test_cancellation_between_records() {
        let (snap, _) = snapshot_with_links();
        let store = MemStore(snap);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_backup(&store, &opts(), &cancel, &mut |_| {}).unwrap_err();
        assert!(matches!(err, ArchiveError::Cancelled));
    }

    #[test]
    fn test_access_batch_renders_cards() {
        let (snap, _) = snapshot_with_links();
        let store = MemStore(snap);
        let outcome =
            run_access_batch(&store, &opts(), &CancelToken::new(), &mut |_| {}).unwrap();
        assert_eq!(outcome.rendered, 1);
        let names = names_of(&outcome.bytes);
        assert!(names.iter().any(|n| n == "Acces/Ana_Mercier.pdf"));
    }

    #[test]
    fn test_export_single_applies_clearance() {
        let (mut snap, _) = snapshot_with_links();
        let report_id = snap.reports[0].id;
        snap.redaction_versions.push(greffe_core::RedactionVersion {
            id: Uuid::new_v4(),
            document_id: report_id,
            version_type: greffe_core::VersionType::Public,
            redacted_fields: ["officer".to_string()].into(),
            created_by: "admin".into(),
            created_at: Utc::now(),
        });

        let export =
            export_single(&snap, RecordKind::Report, report_id, 1, &opts()).unwrap();
        assert_eq!(export.filename, "2026_03_02_rapport_Rapport_lie.pdf");
        assert!(export.bytes.starts_with(b"%PDF"));

        // Clearance 3 has no partial version: full document, never public.
        let export = export_single(&snap, RecordKind::Report, report_id, 3, &opts()).unwrap();
        assert!(export.bytes.starts_with(b"%PDF"));

        let missing = export_single(&snap, RecordKind::Report, Uuid::new_v4(), 5, &opts());
        assert!(matches!(missing.unwrap_err(), ArchiveError::Fatal(_)));
    }
}

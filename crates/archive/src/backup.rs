//! The batch archival pipeline: one snapshot fetch, strictly sequential
//! per-record rendering, then one compressed bundle. Rendering is sequential
//! because every render call owns a fresh off-screen surface; the archive
//! insertion order stays deterministic regardless.

use crate::bind::{self, BoundRecord};
use crate::naming;
use crate::{ArchiveError, Result};
use greffe_core::{RecordKind, RecordStore, Snapshot};
use greffe_raster::{paginate, Glyphs, PageGeometry};
use greffe_render::{render, Author, Locale, RenderContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Job phases, in the order a successful run traverses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Fetching,
    Rendering { collection: RecordKind, index: usize },
    Compressing,
    Done,
    Failed,
    Cancelled,
}

/// Cooperative cancellation flag, checked between records and never
/// mid-render; a render is an atomic unit of work.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs of one batch job. `now` is injected so bundle names and stamps are
/// reproducible.
#[derive(Clone)]
pub struct BackupOptions {
    pub operator: Author,
    pub locale: Locale,
    pub page: PageGeometry,
    pub now: DateTime<Utc>,
}

impl BackupOptions {
    pub fn new(operator: Author) -> Self {
        Self {
            operator,
            locale: Locale::default(),
            page: PageGeometry::default(),
            now: Utc::now(),
        }
    }
}

/// One per-record failure, recorded in the manifest instead of aborting the
/// whole bundle.
#[derive(Debug, Clone, Serialize)]
pub struct FailureNote {
    pub kind: RecordKind,
    pub id: Uuid,
    pub name: String,
    pub error: String,
}

#[derive(Serialize)]
struct ManifestEntry {
    path: String,
    sha256: String,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    rendered: usize,
    artifacts: Vec<ManifestEntry>,
    failures: &'a [FailureNote],
}

/// Result of a completed batch job.
#[derive(Debug)]
pub struct BackupOutcome {
    pub archive_name: String,
    pub bytes: Vec<u8>,
    /// Distinct records rendered (linked references excluded).
    pub rendered: usize,
    pub failures: Vec<FailureNote>,
}

struct Job<'a> {
    opts: &'a BackupOptions,
    glyphs: Glyphs,
    phase: JobPhase,
    /// Artifact bytes per record id; linked records resolve here instead of
    /// rendering again.
    index: HashMap<Uuid, Arc<Vec<u8>>>,
    entries: Vec<(String, Arc<Vec<u8>>)>,
    used_paths: HashSet<String>,
    failures: Vec<FailureNote>,
    rendered: usize,
}

impl<'a> Job<'a> {
    fn new(opts: &'a BackupOptions) -> Self {
        Self {
            opts,
            glyphs: Glyphs::discover(),
            phase: JobPhase::Idle,
            index: HashMap::new(),
            entries: Vec::new(),
            used_paths: HashSet::new(),
            failures: Vec::new(),
            rendered: 0,
        }
    }

    fn enter(&mut self, next: JobPhase) {
        log::debug!("job phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Cancellation checkpoint, placed between records only.
    fn checkpoint(&mut self, cancel: &CancelToken) -> Result<()> {
        if cancel.is_cancelled() {
            self.enter(JobPhase::Cancelled);
            return Err(ArchiveError::Cancelled);
        }
        Ok(())
    }

    fn context(&self, reference: String) -> RenderContext {
        RenderContext {
            author: self.opts.operator.clone(),
            locale: self.opts.locale,
            reference,
            generated_at: self.opts.now,
        }
    }

    /// Renders one bound record to PDF bytes. The off-screen surface lives
    /// inside the paginate call and is released on every path.
    fn render_bound(&self, bound: &BoundRecord) -> Result<Vec<u8>> {
        let instance = &bound.instance;
        let ctx = self.context(naming::short_id(&bound.id).to_uppercase());
        let tree = render(
            &instance.template,
            &instance.values,
            instance.narrative.as_deref(),
            &instance.redacted_fields,
            &ctx,
        );
        let artifact = paginate(&tree, self.opts.page, &self.glyphs)?;
        Ok(greffe_pdf::assemble(&artifact)?)
    }

    /// Archive paths are derived from human-typed names, so homonyms and
    /// repeated links collide. The zip format rejects duplicate entry names;
    /// a numeric suffix keeps every artifact instead.
    fn unique_path(&mut self, path: String) -> String {
        if self.used_paths.insert(path.clone()) {
            return path;
        }
        let (stem, ext) = match path.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), format!(".{ext}")),
            None => (path.clone(), String::new()),
        };
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}{ext}");
            if self.used_paths.insert(candidate.clone()) {
                log::debug!("entry name collision, {path} stored as {candidate}");
                return candidate;
            }
            n += 1;
        }
    }

    /// Per-record step with failure isolation: a broken record becomes a
    /// manifest note, not a dead archive.
    fn process(&mut self, bound: BoundRecord, path: String) {
        match self.render_bound(&bound) {
            Ok(bytes) => {
                let bytes = Arc::new(bytes);
                let path = self.unique_path(path);
                self.index.insert(bound.id, bytes.clone());
                self.entries.push((path, bytes));
                self.rendered += 1;
            }
            Err(err) => {
                log::error!("rendering {:?} {} failed: {}", bound.kind, bound.id, err);
                self.failures.push(FailureNote {
                    kind: bound.kind,
                    id: bound.id,
                    name: bound.display_name,
                    error: err.to_string(),
                });
            }
        }
    }

    fn compress(mut self, archive_name: String) -> Result<BackupOutcome> {
        self.enter(JobPhase::Compressing);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut manifest_entries = Vec::with_capacity(self.entries.len());
        for (path, bytes) in &self.entries {
            zip.start_file(path.clone(), options)?;
            zip.write_all(bytes)?;
            manifest_entries.push(ManifestEntry {
                path: path.clone(),
                sha256: hex::encode(Sha256::digest(bytes.as_slice())),
            });
        }

        let manifest = Manifest {
            generated_at: self.opts.now,
            rendered: self.rendered,
            artifacts: manifest_entries,
            failures: &self.failures,
        };
        zip.start_file("manifeste.json", options)?;
        zip.write_all(&serde_json::to_vec_pretty(&manifest)?)?;

        let bytes = zip.finish()?.into_inner();
        self.enter(JobPhase::Done);
        Ok(BackupOutcome {
            archive_name,
            bytes,
            rendered: self.rendered,
            failures: self.failures,
        })
    }
}

fn fetch(
    job: &mut Job<'_>,
    store: &dyn RecordStore,
    progress: &mut dyn FnMut(&str),
) -> Result<Snapshot> {
    job.enter(JobPhase::Fetching);
    progress("Récupération des données…");
    // A failed initial fetch is fatal: no partial archive.
    match store.snapshot() {
        Ok(snap) => Ok(snap),
        Err(e) => {
            job.enter(JobPhase::Failed);
            Err(ArchiveError::Fatal(e.to_string()))
        }
    }
}

/// Runs the full archival job: every collection, one bundle.
///
/// Progress strings are advisory only; they drive an indicator, never flow
/// control.
pub fn run_backup(
    store: &dyn RecordStore,
    opts: &BackupOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(&str),
) -> Result<BackupOutcome> {
    let mut job = Job::new(opts);
    let snap = fetch(&mut job, store, progress)?;

    let total = snap.reports.len();
    for (i, report) in snap.reports.iter().enumerate() {
        job.checkpoint(cancel)?;
        job.enter(JobPhase::Rendering { collection: RecordKind::Report, index: i });
        progress(&format!("Rapports {}/{} — {}", i + 1, total, report.title));
        let bound = bind::bind_report(&snap, report);
        let path = format!(
            "{}/{}_{}.pdf",
            RecordKind::Report.folder(),
            naming::short_id(&report.id),
            naming::sanitize(&report.title)
        );
        job.process(bound, path);
    }

    let total = snap.civilians.len();
    for (i, civilian) in snap.civilians.iter().enumerate() {
        job.checkpoint(cancel)?;
        job.enter(JobPhase::Rendering { collection: RecordKind::Civilian, index: i });
        progress(&format!("Civils {}/{} — {}", i + 1, total, civilian.full_name()));
        let bound = bind::bind_civilian(&snap, civilian);
        let path = format!(
            "{}/{}.pdf",
            RecordKind::Civilian.folder(),
            naming::sanitize(&civilian.full_name())
        );
        job.process(bound, path);
    }

    let total = snap.arrests.len();
    for (i, arrest) in snap.arrests.iter().enumerate() {
        job.checkpoint(cancel)?;
        job.enter(JobPhase::Rendering { collection: RecordKind::Arrest, index: i });
        progress(&format!("Arrestations {}/{} — {}", i + 1, total, arrest.suspect_name));
        let bound = bind::bind_arrest(&snap, arrest);
        let path = format!(
            "{}/{}_{}.pdf",
            RecordKind::Arrest.folder(),
            naming::short_id(&arrest.id),
            naming::sanitize(&arrest.suspect_name)
        );
        job.process(bound, path);
    }

    let total = snap.investigations.len();
    for (i, investigation) in snap.investigations.iter().enumerate() {
        job.checkpoint(cancel)?;
        job.enter(JobPhase::Rendering { collection: RecordKind::Investigation, index: i });
        progress(&format!(
            "Investigations {}/{} — {}",
            i + 1,
            total,
            investigation.case_number
        ));
        let folder = format!(
            "{}/{}",
            RecordKind::Investigation.folder(),
            naming::sanitize(&investigation.case_number)
        );
        let bound = bind::bind_investigation(&snap, investigation);
        job.process(bound, format!("{folder}/dossier.pdf"));

        // Cross-references: a linked record already rendered above is
        // referenced here, never rendered a second time.
        for link in snap
            .investigation_links
            .iter()
            .filter(|l| l.investigation_id == investigation.id)
        {
            match job.index.get(&link.linked_id).cloned() {
                Some(bytes) => {
                    // One reference per link; a second link to the same
                    // record gets a suffixed name, never a duplicate entry.
                    let path = job.unique_path(format!(
                        "{folder}/{}_{}.pdf",
                        link.linked_kind.slug(),
                        naming::short_id(&link.linked_id)
                    ));
                    job.entries.push((path, bytes));
                }
                None => {
                    log::warn!(
                        "link {} points at {} with no rendered artifact",
                        link.id,
                        link.linked_id
                    );
                    job.failures.push(FailureNote {
                        kind: link.linked_kind,
                        id: link.linked_id,
                        name: format!("lien {}", link.id),
                        error: "aucun artefact généré pour ce lien".to_string(),
                    });
                }
            }
        }
    }

    job.checkpoint(cancel)?;
    progress("Compression de l'archive…");
    let outcome = job.compress(naming::archive_filename(opts.now))?;
    progress("Archive prête.");
    Ok(outcome)
}

/// Narrower batch for credential-issuance documents: access cards for every
/// civilian, same pipeline skeleton, its own bundle.
pub fn run_access_batch(
    store: &dyn RecordStore,
    opts: &BackupOptions,
    cancel: &CancelToken,
    progress: &mut dyn FnMut(&str),
) -> Result<BackupOutcome> {
    let mut job = Job::new(opts);
    let snap = fetch(&mut job, store, progress)?;

    let total = snap.civilians.len();
    for (i, civilian) in snap.civilians.iter().enumerate() {
        job.checkpoint(cancel)?;
        job.enter(JobPhase::Rendering { collection: RecordKind::Civilian, index: i });
        progress(&format!("Titres d'accès {}/{}", i + 1, total));
        let bound = bind::bind_access(civilian);
        let path = format!("Acces/{}.pdf", naming::sanitize(&civilian.full_name()));
        job.process(bound, path);
    }

    job.checkpoint(cancel)?;
    progress("Compression de l'archive…");
    job.compress(format!("{}_acces_greffe.zip", opts.now.format("%Y_%m_%d")))
}

/// Output of a single-document export.
#[derive(Debug)]
pub struct SingleExport {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Renders one record to a downloadable PDF, applying the redaction version
/// selected by the viewer's clearance. A failure leaves no partial file.
pub fn export_single(
    snap: &Snapshot,
    kind: RecordKind,
    id: Uuid,
    clearance: i32,
    opts: &BackupOptions,
) -> Result<SingleExport> {
    let mut bound = bind::bind(snap, kind, id)
        .ok_or_else(|| ArchiveError::Fatal(format!("enregistrement {id} introuvable")))?;

    let versions: Vec<_> = snap
        .redaction_versions
        .iter()
        .filter(|v| v.document_id == id)
        .cloned()
        .collect();
    if let Some(version) = greffe_redact::select_version(clearance, &versions) {
        bound.instance.redacted_fields = version.redacted_fields.clone();
    }

    let job = Job::new(opts);
    let bytes = job.render_bound(&bound)?;
    Ok(SingleExport {
        filename: naming::export_filename(opts.now, kind.slug(), &bound.display_name),
        bytes,
    })
}

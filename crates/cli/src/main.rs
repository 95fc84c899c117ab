//! Command-line driver: single-document export and full archival backups
//! over a JSON data directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use greffe_archive::{export_single, run_access_batch, run_backup, BackupOptions, CancelToken};
use greffe_core::{RecordKind, RecordStore};
use greffe_render::Author;
use std::path::PathBuf;
use uuid::Uuid;

mod store;

#[derive(Parser, Debug)]
#[command(name = "greffe", version, about = "Records office document exports")]
struct Cli {
    /// Data directory holding one JSON file per collection
    #[arg(long, global = true, default_value = "data")]
    data: PathBuf,
    /// Operator name stamped on generated documents
    #[arg(long, global = true, default_value = "Agent de permanence")]
    operator: String,
    /// Operator badge number
    #[arg(long, global = true, default_value = "N/A")]
    badge: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Report,
    Civilian,
    Arrest,
    Investigation,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Report => RecordKind::Report,
            KindArg::Civilian => RecordKind::Civilian,
            KindArg::Arrest => RecordKind::Arrest,
            KindArg::Investigation => RecordKind::Investigation,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every collection into one compressed archive
    Backup {
        /// Output directory for the bundle
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Render credential-issuance documents for every civilian
    Access {
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Export one record as a standalone PDF
    Export {
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        id: Uuid,
        /// Viewer clearance level, selects the redaction version
        #[arg(long, default_value_t = 5)]
        clearance: i32,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn options(cli: &Cli) -> BackupOptions {
    BackupOptions::new(Author {
        name: cli.operator.clone(),
        badge: cli.badge.clone(),
        specialty: None,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let store = store::JsonStore::open(&cli.data)?;
    let opts = options(&cli);

    match &cli.command {
        Commands::Backup { out } => {
            let mut progress = |status: &str| eprintln!("{status}");
            let outcome = run_backup(&store, &opts, &CancelToken::new(), &mut progress)?;
            let path = out.join(&outcome.archive_name);
            std::fs::write(&path, &outcome.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            for failure in &outcome.failures {
                log::warn!("échec: {} ({})", failure.name, failure.error);
            }
            println!(
                "{} — {} document(s), {} échec(s)",
                path.display(),
                outcome.rendered,
                outcome.failures.len()
            );
        }
        Commands::Access { out } => {
            let mut progress = |status: &str| eprintln!("{status}");
            let outcome = run_access_batch(&store, &opts, &CancelToken::new(), &mut progress)?;
            let path = out.join(&outcome.archive_name);
            std::fs::write(&path, &outcome.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{} — {} titre(s) d'accès", path.display(), outcome.rendered);
        }
        Commands::Export {
            kind,
            id,
            clearance,
            out,
        } => {
            let snap = store
                .snapshot()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            let export = export_single(&snap, (*kind).into(), *id, *clearance, &opts)?;
            let path = out.join(&export.filename);
            std::fs::write(&path, &export.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

//! JSON directory store: one file per collection, used for offline runs and
//! for exercising the pipeline without the hosted backend.

use anyhow::{Context, Result};
use greffe_core::{CoreError, RecordStore, Snapshot};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("data directory {} does not exist", dir.display());
        }
        Ok(Self { dir: dir.to_path_buf() })
    }

    /// Missing collection files read as empty collections; a present but
    /// malformed file is an error, not an empty list.
    fn collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.dir.join(format!("{name}.json"));
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn load(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            reports: self.collection("reports")?,
            civilians: self.collection("civilians")?,
            arrests: self.collection("arrests")?,
            investigations: self.collection("investigations")?,
            investigation_links: self.collection("investigation_links")?,
            templates: self.collection("templates")?,
            charges: self.collection("charges")?,
            redaction_versions: self.collection("redaction_versions")?,
        })
    }
}

impl RecordStore for JsonStore {
    fn snapshot(&self) -> greffe_core::Result<Snapshot> {
        self.load().map_err(|e| CoreError::Store(format!("{e:#}")))
    }
}

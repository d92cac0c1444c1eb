//! On-disk layout of a nomenclature store and the run lock guarding it.
//!
//! ```text
//! <data_dir>/<PREFIX>_nomenclature/
//!     founders.json.gz
//!     history/founders_<timestamp>.json.gz
//!     change_log/<YYYY-MM-DD>.tsv
//!     nomenclature.lock
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use log::{debug, info, warn};

use allelecode_core::Hierarchy;

use crate::changelog::{ChangeLogEntry, append_change_log};
use crate::errors::StoreError;
use crate::snapshot::StoreSnapshot;
use crate::store::FounderStore;

const SNAPSHOT_FILE: &str = "founders.json.gz";
const HISTORY_DIR: &str = "history";
const CHANGE_LOG_DIR: &str = "change_log";
const LOCK_FILE: &str = "nomenclature.lock";

///
/// Paths of one prefix's store under a data directory.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(data_dir: &Path, prefix: &str) -> Self {
        StoreLayout {
            root: data_dir.join(format!("{}_nomenclature", prefix)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    fn snapshot_tmp(&self) -> PathBuf {
        self.root.join(format!("{}.tmp", SNAPSHOT_FILE))
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join(HISTORY_DIR)
    }

    pub fn change_log_dir(&self) -> PathBuf {
        self.root.join(CHANGE_LOG_DIR)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }
}

///
/// Exclusive advisory lock on a store, held for the length of a run and
/// released on drop.
///
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    pub fn acquire(layout: &StoreLayout) -> Result<Self, StoreError> {
        fs::create_dir_all(layout.root())?;

        let path = layout.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        FileExt::try_lock_exclusive(&file).map_err(|_| StoreError::StoreLocked(path.clone()))?;

        debug!("Acquired store lock {:?}", path);
        Ok(StoreLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release store lock {:?}: {}", self.path, e);
        }
    }
}

///
/// Load the store of `hierarchy`'s prefix. A data directory without a
/// snapshot yields an empty store.
///
pub fn load_store(layout: &StoreLayout, hierarchy: &Hierarchy) -> Result<FounderStore, StoreError> {
    let path = layout.snapshot();
    if !path.exists() {
        info!(
            "No snapshot at {:?}; starting an empty {} store",
            path,
            hierarchy.prefix()
        );
        return Ok(FounderStore::for_hierarchy(hierarchy));
    }

    let store = StoreSnapshot::read(&path)?.into_store(hierarchy)?;
    info!("Loaded {} founders from {:?}", store.len(), path);

    Ok(store)
}

///
/// Commit a run: write the new snapshot next to the current one, keep the
/// current one in `history/`, move the new one into place and append the
/// run's changes to the change log.
///
/// # Arguments
/// - layout: store paths
/// - store: store state at the end of the run
/// - hierarchy: scheme the run used
/// - changes: change log entries of the run, in order
/// - profiles: number of profiles the run processed
///
pub fn save_store(
    layout: &StoreLayout,
    store: &FounderStore,
    hierarchy: &Hierarchy,
    changes: &[ChangeLogEntry],
    profiles: usize,
) -> Result<(), StoreError> {
    fs::create_dir_all(layout.root())?;

    let tmp = layout.snapshot_tmp();
    StoreSnapshot::from_store(store, hierarchy).write(&tmp)?;

    let current = layout.snapshot();
    if current.exists() {
        let history = layout.history_dir();
        fs::create_dir_all(&history)?;
        let backup = history.join(format!(
            "founders_{}.json.gz",
            Utc::now().format("%Y%m%d_%H%M%S_%3f")
        ));
        fs::copy(&current, &backup)?;
        debug!("Previous snapshot kept as {:?}", backup);
    }

    fs::rename(&tmp, &current)?;
    append_change_log(&layout.change_log_dir(), changes, profiles)?;

    info!(
        "Saved {} founders to {:?} ({} changes logged)",
        store.len(),
        current,
        changes.len()
    );
    Ok(())
}

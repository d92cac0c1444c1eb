use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use allelecode_core::Hierarchy;
use allelecode_core::models::code::{format_prefix, parse_prefix};
use allelecode_core::models::{AlleleProfile, FounderRecord, NomenclatureCode};
use allelecode_core::utils::get_dynamic_reader;

use crate::errors::StoreError;
use crate::store::FounderStore;

/// Version of the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// One founder as stored: calls use `0` for a no-call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FounderEntry {
    pub sample: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub calls: Vec<u32>,
}

/// Branch integers registered under one parent prefix (`""` is the root).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BranchEntry {
    pub parent: String,
    pub children: Vec<u32>,
}

///
/// Serialized form of a [`FounderStore`], written as gzip'd JSON.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    /// Version of the snapshot format
    pub version: u32,
    /// Organism prefix
    pub prefix: String,
    /// Thresholds the codes were assigned under, coarsest first
    pub thresholds: Vec<u32>,
    /// Locus order of the stored calls
    pub loci: Vec<String>,
    pub saved_at: DateTime<Utc>,
    pub founders: Vec<FounderEntry>,
    pub branches: Vec<BranchEntry>,
}

impl StoreSnapshot {
    pub fn from_store(store: &FounderStore, hierarchy: &Hierarchy) -> Self {
        let founders = store
            .records()
            .map(|record| FounderEntry {
                sample: record.sample().to_string(),
                code: record.code.to_string(),
                aliases: record.aliases.iter().map(|a| a.to_string()).collect(),
                calls: record.profile.to_encoded(),
            })
            .collect();

        let branches = store
            .registry()
            .into_iter()
            .map(|(parent, children)| BranchEntry {
                parent: format_prefix(&parent),
                children,
            })
            .collect();

        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            prefix: store.prefix().to_string(),
            thresholds: hierarchy.thresholds(),
            loci: store.loci().to_vec(),
            saved_at: Utc::now(),
            founders,
            branches,
        }
    }

    ///
    /// Check the snapshot against `hierarchy` and rebuild the store.
    ///
    /// Prefix and depth must match. The stored locus set must equal the
    /// scheme's; when only the order differs every profile is remapped to the
    /// scheme order. The rebuilt store is validated.
    ///
    pub fn into_store(self, hierarchy: &Hierarchy) -> Result<FounderStore, StoreError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if self.prefix != hierarchy.prefix() {
            return Err(StoreError::PrefixMismatch {
                found: self.prefix,
                expected: hierarchy.prefix().to_string(),
            });
        }
        if self.thresholds.len() != hierarchy.depth() {
            return Err(StoreError::DepthMismatch {
                found: self.thresholds.len(),
                expected: hierarchy.depth(),
            });
        }
        if self.thresholds != hierarchy.thresholds() {
            warn!(
                "Stored codes were assigned with thresholds {:?}, scheme now uses {:?}",
                self.thresholds,
                hierarchy.thresholds()
            );
        }

        let stored: HashSet<&str> = self.loci.iter().map(String::as_str).collect();
        let scheme: HashSet<&str> = hierarchy.loci().iter().map(String::as_str).collect();
        let missing = scheme.difference(&stored).count();
        let extra = stored.difference(&scheme).count();
        if missing > 0 || extra > 0 || self.loci.len() != hierarchy.loci().len() {
            return Err(StoreError::LocusMismatch { missing, extra });
        }

        let reorder = self.loci != hierarchy.loci();
        if reorder {
            info!("Stored locus order differs from the scheme; remapping founder profiles");
        }

        let mut records = Vec::with_capacity(self.founders.len());
        for entry in self.founders {
            if entry.calls.len() != self.loci.len() {
                return Err(StoreError::CallCount {
                    sample: entry.sample,
                    found: entry.calls.len(),
                    expected: self.loci.len(),
                });
            }

            let mut profile = AlleleProfile::from_encoded(entry.sample, &entry.calls);
            if reorder {
                profile = profile.remap(&self.loci, hierarchy.loci());
            }

            let code = NomenclatureCode::new(parse_prefix(&entry.code)?);
            let aliases = entry
                .aliases
                .iter()
                .map(|alias| parse_prefix(alias).map(NomenclatureCode::new))
                .collect::<Result<Vec<_>, _>>()?;

            records.push(FounderRecord::new(profile, code).with_aliases(aliases));
        }

        let registry = self
            .branches
            .into_iter()
            .map(|entry| Ok((parse_prefix(&entry.parent)?, entry.children)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        let store = FounderStore::from_parts(
            self.prefix,
            hierarchy.depth(),
            hierarchy.loci().to_vec(),
            records,
            registry,
        )?;

        Ok(store)
    }

    /// Read a snapshot; gzip is detected from the `.gz` extension.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let reader = get_dynamic_reader(path)?;
        let snapshot = serde_json::from_reader(reader)?;
        Ok(snapshot)
    }

    /// Write the snapshot as gzip'd JSON and sync it to disk.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, self)?;

        let mut writer = encoder.finish()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        Ok(())
    }
}

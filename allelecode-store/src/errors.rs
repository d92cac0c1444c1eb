use std::path::PathBuf;

use thiserror::Error;

use allelecode_core::errors::DataIntegrityError;
use allelecode_core::models::code::ParseCodeError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store {0:?} is locked by another nomenclature run")]
    StoreLocked(PathBuf),

    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Snapshot belongs to prefix `{found}`, scheme is `{expected}`")]
    PrefixMismatch { found: String, expected: String },

    #[error("Snapshot has {found} levels, scheme has {expected}")]
    DepthMismatch { found: usize, expected: usize },

    #[error(
        "Snapshot loci differ from the scheme: {missing} scheme loci not stored, {extra} stored loci not in the scheme"
    )]
    LocusMismatch { missing: usize, extra: usize },

    #[error("Snapshot lists sample `{sample}` with {found} calls for {expected} loci")]
    CallCount {
        sample: String,
        found: usize,
        expected: usize,
    },

    #[error(transparent)]
    Code(#[from] ParseCodeError),

    #[error(transparent)]
    Integrity(#[from] DataIntegrityError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

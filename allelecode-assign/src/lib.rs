//! # Assignment engine for hierarchical allele-code nomenclature
//!
//! Profiles are processed one at a time against a [`FounderStore`]: each one
//! walks the threshold levels from coarse to fine, retaining, opening or
//! merging branches, and ends with a full nomenclature code.
//!
//! - `engine` - the per-profile walk and run bookkeeping
//! - `merge` - branch merges and the reassessment queue
//! - `qc` - called-locus fraction checks
//! - `xcodes` - rendering of over-dispersed codes
//! - `results` - the `Key`/`Allele_code` result table
//!
//! [`FounderStore`]: allelecode_store::FounderStore

pub mod engine;
pub mod merge;
pub mod qc;
pub mod results;
pub mod xcodes;

pub use engine::{Assignment, AssignmentEngine, AssignmentStatus, LevelDecision, RunOutcome, RunStats};
pub use qc::PartialProfileWarning;
pub use xcodes::XcodeList;

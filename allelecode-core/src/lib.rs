//! # Core types for hierarchical cgMLST allele-code nomenclature
//!
//! This crate holds everything that does not touch the founder store:
//!
//! - `models` - allele profiles, nomenclature codes and founder records
//! - `distance` - pairwise allelic distance between profiles
//! - `hierarchy` - threshold schemes, loaded from TOML/YAML or a built-in preset
//! - `utils` - locus lists and allele profile tables (CSV/TSV, optionally gzip'd)

pub mod consts;
pub mod distance;
pub mod errors;
pub mod hierarchy;
pub mod models;
pub mod utils;

pub use hierarchy::{Hierarchy, ThresholdLevel, load_hierarchy};
pub use models::{AlleleCall, AlleleProfile, FounderRecord, NomenclatureCode};

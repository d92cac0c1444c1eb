//! Nomenclature schemes: the ordered distance thresholds of an organism
//! prefix together with the core loci used to compare profiles.
//!
//! A scheme comes either from a TOML/YAML file or from one of the built-in
//! presets. Either way it is validated once and turned into an immutable
//! [`Hierarchy`] that is shared by the rest of a run.

use std::ffi::OsStr;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MIN_PRESENCE, PRESETS};
use crate::errors::ConfigError;
use crate::utils::read_locus_list;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One level of the hierarchy: its index (0 = coarsest) and the largest
/// distance at which a profile still joins an existing branch.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdLevel {
    pub level: usize,
    pub threshold: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LociSource {
    Inline(Vec<String>),
    File(PathBuf),
}

///
/// On-disk form of a scheme.
///
/// ```toml
/// prefix = "SALM"
/// min_presence = 0.95
/// loci = "salm_loci.txt"
///
/// [[levels]]
/// level = 0
/// threshold = 80
/// ```
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SchemeConfig {
    pub prefix: String,
    #[serde(default = "default_min_presence")]
    pub min_presence: f64,
    #[serde(default)]
    pub loci: Option<LociSource>,
    pub levels: Vec<ThresholdLevel>,
}

fn default_min_presence() -> f64 {
    DEFAULT_MIN_PRESENCE
}

#[derive(Debug)]
pub enum SchemeFileType {
    Toml,
    Yaml,
}

impl SchemeFileType {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some("toml") => Ok(SchemeFileType::Toml),
            Some("yaml") | Some("yml") => Ok(SchemeFileType::Yaml),
            _ => Err(ConfigError::InvalidFileType(path.display().to_string())),
        }
    }
}

impl TryFrom<&Path> for SchemeConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let content = read_to_string(path)?;
        let mut config: SchemeConfig = match SchemeFileType::from_path(path)? {
            SchemeFileType::Toml => toml::from_str(&content)?,
            SchemeFileType::Yaml => serde_yaml::from_str(&content)?,
        };

        // locus files are resolved relative to the scheme file
        if let Some(LociSource::File(loci)) = &config.loci {
            if loci.is_relative() {
                if let Some(dir) = path.parent() {
                    config.loci = Some(LociSource::File(dir.join(loci)));
                }
            }
        }

        Ok(config)
    }
}

///
/// A validated nomenclature hierarchy for one organism prefix.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    prefix: String,
    levels: Vec<ThresholdLevel>,
    loci: Vec<String>,
    min_presence: f64,
}

impl Hierarchy {
    ///
    /// Validate and build a hierarchy. `levels` may arrive in any order; their
    /// `level` indices dictate the order, and must run contiguously from 0.
    ///
    pub fn new(
        prefix: impl Into<String>,
        mut levels: Vec<ThresholdLevel>,
        loci: Vec<String>,
        min_presence: f64,
    ) -> ConfigResult<Self> {
        if levels.is_empty() {
            return Err(ConfigError::EmptyHierarchy);
        }

        levels.sort_by_key(|l| l.level);
        for (expected, pair) in levels.iter().enumerate() {
            if pair.level < expected {
                return Err(ConfigError::DuplicateLevel(pair.level));
            }
            if pair.level > expected {
                return Err(ConfigError::MissingLevel {
                    missing: expected,
                    found: levels.len(),
                });
            }
        }

        for window in levels.windows(2) {
            if window[1].threshold > window[0].threshold {
                return Err(ConfigError::IncreasingThreshold {
                    level: window[1].level,
                    threshold: window[1].threshold,
                    previous: window[0].threshold,
                });
            }
        }

        if loci.is_empty() {
            return Err(ConfigError::EmptyLocusList);
        }
        let mut seen = std::collections::HashSet::with_capacity(loci.len());
        for locus in &loci {
            if !seen.insert(locus.as_str()) {
                return Err(ConfigError::DuplicateLocus(locus.clone()));
            }
        }

        if !(0.0..=1.0).contains(&min_presence) {
            return Err(ConfigError::InvalidMinPresence(min_presence));
        }

        Ok(Hierarchy {
            prefix: prefix.into(),
            levels,
            loci,
            min_presence,
        })
    }

    ///
    /// Build a hierarchy from a parsed scheme file. `loci_override` replaces
    /// any locus list named by the scheme.
    ///
    pub fn from_config(config: SchemeConfig, loci_override: Option<&Path>) -> ConfigResult<Self> {
        let loci = match (loci_override, config.loci) {
            (Some(path), _) => read_locus_list(path, None)?,
            (None, Some(LociSource::File(path))) => read_locus_list(&path, None)?,
            (None, Some(LociSource::Inline(loci))) => loci,
            (None, None) => return Err(ConfigError::MissingLoci(config.prefix)),
        };

        Hierarchy::new(config.prefix, config.levels, loci, config.min_presence)
    }

    ///
    /// Build one of the built-in organism schemes. Preset locus files follow
    /// the convention of prefixing every core locus with the organism prefix,
    /// so only lines starting with the prefix are kept.
    ///
    pub fn from_preset(name: &str, loci_path: &Path) -> ConfigResult<Self> {
        let (prefix, thresholds) = PRESETS
            .iter()
            .find(|(prefix, _)| prefix.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;

        let levels = thresholds
            .iter()
            .enumerate()
            .map(|(level, &threshold)| ThresholdLevel { level, threshold })
            .collect();
        let loci = read_locus_list(loci_path, Some(*prefix))?;

        Hierarchy::new(*prefix, levels, loci, DEFAULT_MIN_PRESENCE)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of levels, which is also the length of every code.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[ThresholdLevel] {
        &self.levels
    }

    pub fn threshold(&self, level: usize) -> Option<u32> {
        self.levels.get(level).map(|l| l.threshold)
    }

    pub fn thresholds(&self) -> Vec<u32> {
        self.levels.iter().map(|l| l.threshold).collect()
    }

    pub fn loci(&self) -> &[String] {
        &self.loci
    }

    pub fn min_presence(&self) -> f64 {
        self.min_presence
    }
}

///
/// Resolve a scheme argument: a path to a TOML/YAML scheme file, or the name
/// of a built-in preset (which then needs `loci`).
///
/// # Arguments
/// - scheme: file path or preset name (`CAMP`, `LMO`, `SALM`, `EC`)
/// - loci: optional core locus list, overriding the scheme's own list
///
pub fn load_hierarchy(scheme: &str, loci: Option<&Path>) -> ConfigResult<Hierarchy> {
    let path = Path::new(scheme);
    if path.is_file() {
        let config = SchemeConfig::try_from(path)?;
        return Hierarchy::from_config(config, loci);
    }

    match loci {
        Some(loci) => Hierarchy::from_preset(scheme, loci),
        None if PRESETS.iter().any(|(p, _)| p.eq_ignore_ascii_case(scheme)) => {
            Err(ConfigError::MissingLoci(scheme.to_string()))
        }
        None => Err(ConfigError::UnknownPreset(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn loci(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("L{}", i)).collect()
    }

    fn levels(thresholds: &[u32]) -> Vec<ThresholdLevel> {
        thresholds
            .iter()
            .enumerate()
            .map(|(level, &threshold)| ThresholdLevel { level, threshold })
            .collect()
    }

    fn get_test_path(file_name: &str) -> PathBuf {
        PathBuf::from("../tests/data/allelecode").join(file_name)
    }

    #[rstest]
    fn test_valid_hierarchy() {
        let h = Hierarchy::new("TEST", levels(&[10, 2]), loci(4), 0.9).unwrap();
        assert_eq!(h.depth(), 2);
        assert_eq!(h.thresholds(), vec![10, 2]);
        assert_eq!(h.threshold(1), Some(2));
        assert_eq!(h.threshold(2), None);
    }

    #[rstest]
    fn test_equal_thresholds_are_allowed() {
        assert!(Hierarchy::new("TEST", levels(&[5, 5, 1]), loci(2), 0.9).is_ok());
    }

    #[rstest]
    fn test_increasing_threshold_is_rejected() {
        let result = Hierarchy::new("TEST", levels(&[10, 20]), loci(2), 0.9);
        assert!(matches!(
            result,
            Err(ConfigError::IncreasingThreshold { level: 1, threshold: 20, previous: 10 })
        ));
    }

    #[rstest]
    fn test_levels_are_ordered_by_index() {
        let shuffled = vec![
            ThresholdLevel { level: 2, threshold: 1 },
            ThresholdLevel { level: 0, threshold: 50 },
            ThresholdLevel { level: 1, threshold: 7 },
        ];
        let h = Hierarchy::new("TEST", shuffled, loci(2), 0.9).unwrap();
        assert_eq!(h.thresholds(), vec![50, 7, 1]);
    }

    #[rstest]
    fn test_gap_and_duplicate_levels_are_rejected() {
        let gap = vec![
            ThresholdLevel { level: 0, threshold: 5 },
            ThresholdLevel { level: 2, threshold: 1 },
        ];
        assert!(matches!(
            Hierarchy::new("TEST", gap, loci(2), 0.9),
            Err(ConfigError::MissingLevel { missing: 1, .. })
        ));

        let duplicate = vec![
            ThresholdLevel { level: 0, threshold: 5 },
            ThresholdLevel { level: 0, threshold: 1 },
        ];
        assert!(matches!(
            Hierarchy::new("TEST", duplicate, loci(2), 0.9),
            Err(ConfigError::DuplicateLevel(0))
        ));
    }

    #[rstest]
    fn test_empty_inputs_are_rejected() {
        assert!(matches!(
            Hierarchy::new("TEST", vec![], loci(2), 0.9),
            Err(ConfigError::EmptyHierarchy)
        ));
        assert!(matches!(
            Hierarchy::new("TEST", levels(&[1]), vec![], 0.9),
            Err(ConfigError::EmptyLocusList)
        ));
    }

    #[rstest]
    fn test_duplicate_locus_and_bad_presence_are_rejected() {
        let dup = vec!["A".to_string(), "A".to_string()];
        assert!(matches!(
            Hierarchy::new("TEST", levels(&[1]), dup, 0.9),
            Err(ConfigError::DuplicateLocus(_))
        ));
        assert!(matches!(
            Hierarchy::new("TEST", levels(&[1]), loci(1), 1.5),
            Err(ConfigError::InvalidMinPresence(_))
        ));
    }

    #[rstest]
    fn test_scheme_file_type() {
        assert!(matches!(
            SchemeFileType::from_path(Path::new("scheme.yml")),
            Ok(SchemeFileType::Yaml)
        ));
        assert!(SchemeFileType::from_path(Path::new("scheme.json")).is_err());
    }

    #[rstest]
    fn test_load_toml_scheme() {
        let path = get_test_path("scheme.toml");
        let h = load_hierarchy(path.to_str().unwrap(), None).unwrap();

        assert_eq!(h.prefix(), "TEST");
        assert_eq!(h.thresholds(), vec![10, 2]);
        assert_eq!(h.loci().len(), 8);
        assert_eq!(h.min_presence(), 0.5);
    }

    #[rstest]
    fn test_load_yaml_scheme_with_inline_loci() {
        let path = get_test_path("scheme.yaml");
        let h = load_hierarchy(path.to_str().unwrap(), None).unwrap();

        assert_eq!(h.prefix(), "YTEST");
        assert_eq!(h.thresholds(), vec![3, 1, 0]);
        assert_eq!(h.loci(), &["y1".to_string(), "y2".to_string(), "y3".to_string()]);
        assert_eq!(h.min_presence(), DEFAULT_MIN_PRESENCE);
    }

    #[rstest]
    fn test_preset_filters_loci_by_prefix() {
        let path = get_test_path("preset_loci.txt");
        let h = load_hierarchy("salm", Some(path.as_path())).unwrap();

        assert_eq!(h.prefix(), "SALM");
        assert_eq!(h.thresholds(), vec![80, 28, 15, 7, 4, 1]);
        assert!(h.loci().iter().all(|l| l.starts_with("SALM")));
        assert_eq!(h.loci().len(), 3);
    }

    #[rstest]
    fn test_preset_without_loci_is_rejected() {
        assert!(matches!(
            load_hierarchy("LMO", None),
            Err(ConfigError::MissingLoci(_))
        ));
        assert!(matches!(
            load_hierarchy("NOPE", None),
            Err(ConfigError::UnknownPreset(_))
        ));
    }
}

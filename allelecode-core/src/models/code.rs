use std::fmt::{self, Display};
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid nomenclature code `{0}`: expected dot-separated positive integers")]
pub struct ParseCodeError(pub String);

///
/// Render a (possibly partial) code as its dot-joined string, e.g. `1.4.2`.
/// The empty prefix renders as an empty string.
///
pub fn format_prefix(parts: &[u32]) -> String {
    parts
        .iter()
        .map(|part| part.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

///
/// Parse a dot-joined prefix as written by [`format_prefix`]. The empty string
/// is the root prefix. Zero components are accepted here so that stored state
/// can be loaded and then validated.
///
pub fn parse_prefix(s: &str) -> Result<Vec<u32>, ParseCodeError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split('.')
        .map(|part| part.parse::<u32>().map_err(|_| ParseCodeError(s.to_string())))
        .collect()
}

///
/// A hierarchical nomenclature code: one positive branch integer per
/// hierarchy level, coarsest first.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NomenclatureCode(Vec<u32>);

impl NomenclatureCode {
    pub fn new(parts: Vec<u32>) -> Self {
        NomenclatureCode(parts)
    }

    /// Number of levels carried by the code.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    ///
    /// Leading `len` branch integers: the ancestor prefix shared with every
    /// code on the same branch down to level `len - 1`.
    ///
    pub fn prefix(&self, len: usize) -> &[u32] {
        &self.0[..len.min(self.0.len())]
    }

    /// Branch integer at `level`, if the code is that deep.
    pub fn branch(&self, level: usize) -> Option<u32> {
        self.0.get(level).copied()
    }

    pub fn starts_with(&self, prefix: &[u32]) -> bool {
        self.0.starts_with(prefix)
    }

    ///
    /// Replace the leading `new_prefix.len()` integers with `new_prefix`,
    /// keeping the deeper levels.
    ///
    pub fn with_prefix(&self, new_prefix: &[u32]) -> Self {
        let mut parts = new_prefix.to_vec();
        parts.extend_from_slice(&self.0[new_prefix.len().min(self.0.len())..]);
        NomenclatureCode(parts)
    }

    pub fn has_zero_branch(&self) -> bool {
        self.0.contains(&0)
    }
}

impl From<Vec<u32>> for NomenclatureCode {
    fn from(parts: Vec<u32>) -> Self {
        NomenclatureCode(parts)
    }
}

impl FromStr for NomenclatureCode {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseCodeError(s.to_string()));
        }

        let parts = trimmed
            .split('.')
            .map(|part| match part.parse::<u32>() {
                Ok(value) if value > 0 => Ok(value),
                _ => Err(ParseCodeError(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NomenclatureCode(parts))
    }
}

impl Display for NomenclatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_prefix(&self.0))
    }
}

use std::collections::HashMap;
use std::fmt::{self, Display};

///
/// A single allele call. `None` is a no-call: the locus was absent, partial
/// or otherwise not typeable in this sample.
///
pub type AlleleCall = Option<u32>;

///
/// Parse one allele-table cell into a call.
///
/// Only positive integers are calls; chewBBACA's inferred alleles (`INF-12`)
/// count as the allele they name. `0`, blanks, negative numbers and caller
/// tags such as `LNF`, `NIPH` or `PLOT3` are no-calls.
///
pub fn parse_allele_call(cell: &str) -> AlleleCall {
    let cell = cell.trim();
    let cell = cell.strip_prefix("INF-").unwrap_or(cell);
    match cell.parse::<i64>() {
        Ok(value) if value > 0 => u32::try_from(value).ok(),
        _ => None,
    }
}

///
/// An allele profile: one call per core locus, aligned to the locus order of
/// the scheme it was built against.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleProfile {
    pub sample: String,
    pub calls: Vec<AlleleCall>,
}

impl AlleleProfile {
    pub fn new(sample: impl Into<String>, calls: Vec<AlleleCall>) -> Self {
        AlleleProfile {
            sample: sample.into(),
            calls,
        }
    }

    ///
    /// Build a profile from a locus-name keyed mapping. Loci missing from the
    /// mapping become no-calls; loci outside `loci` are ignored.
    ///
    /// # Arguments
    /// - sample: sample identifier
    /// - by_locus: locus name -> call
    /// - loci: the scheme's core loci, in scheme order
    ///
    pub fn from_locus_map(
        sample: impl Into<String>,
        by_locus: &HashMap<String, AlleleCall>,
        loci: &[String],
    ) -> Self {
        let calls = loci
            .iter()
            .map(|locus| by_locus.get(locus).copied().flatten())
            .collect();

        AlleleProfile::new(sample, calls)
    }

    ///
    /// Rebuild a profile from its stored form, where `0` marks a no-call.
    ///
    pub fn from_encoded(sample: impl Into<String>, encoded: &[u32]) -> Self {
        let calls = encoded
            .iter()
            .map(|&allele| if allele == 0 { None } else { Some(allele) })
            .collect();

        AlleleProfile::new(sample, calls)
    }

    /// Stored form of the calls, `0` for no-call.
    pub fn to_encoded(&self) -> Vec<u32> {
        self.calls.iter().map(|call| call.unwrap_or(0)).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Number of loci carrying a call.
    pub fn called_loci(&self) -> usize {
        self.calls.iter().filter(|call| call.is_some()).count()
    }

    ///
    /// Fraction of core loci that carry a call, in `[0, 1]`. An empty profile
    /// has presence 0.
    ///
    pub fn presence(&self) -> f64 {
        if self.calls.is_empty() {
            return 0.0;
        }
        self.called_loci() as f64 / self.calls.len() as f64
    }

    ///
    /// Reorder the calls of a profile stored against `from` loci into the
    /// order of `to`. Both slices must name the same loci.
    ///
    pub fn remap(&self, from: &[String], to: &[String]) -> Self {
        let position: HashMap<&str, usize> = from
            .iter()
            .enumerate()
            .map(|(i, locus)| (locus.as_str(), i))
            .collect();

        let calls = to
            .iter()
            .map(|locus| {
                position
                    .get(locus.as_str())
                    .and_then(|&i| self.calls.get(i).copied().flatten())
            })
            .collect();

        AlleleProfile::new(self.sample.clone(), calls)
    }
}

impl Display for AlleleProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} loci called)",
            self.sample,
            self.called_loci(),
            self.len()
        )
    }
}

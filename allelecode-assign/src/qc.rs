use std::fmt::{self, Display};

use allelecode_core::models::AlleleProfile;

///
/// A profile with fewer called core loci than the scheme asks for. It is
/// still assigned; the warning travels with its result.
///
#[derive(Debug, Clone, PartialEq)]
pub struct PartialProfileWarning {
    pub sample: String,
    pub called: usize,
    pub total: usize,
    pub min_presence: f64,
}

impl PartialProfileWarning {
    pub fn presence(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.called as f64 / self.total as f64
    }
}

impl Display for PartialProfileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} core loci called ({:.1}%), below the {:.1}% minimum",
            self.sample,
            self.called,
            self.total,
            self.presence() * 100.0,
            self.min_presence * 100.0
        )
    }
}

/// Flag `profile` when its called fraction of core loci is below `min_presence`.
pub fn check_presence(profile: &AlleleProfile, min_presence: f64) -> Option<PartialProfileWarning> {
    if profile.presence() >= min_presence {
        return None;
    }
    Some(PartialProfileWarning {
        sample: profile.sample.clone(),
        called: profile.called_loci(),
        total: profile.len(),
        min_presence,
    })
}

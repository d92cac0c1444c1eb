use std::fmt::{self, Display};

use super::code::NomenclatureCode;
use super::profile::AlleleProfile;

///
/// A coded reference profile. Founders are never deleted; their code only
/// changes through a merge, and every code they carried before is kept as an
/// alias.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FounderRecord {
    pub profile: AlleleProfile,
    pub code: NomenclatureCode,
    pub aliases: Vec<NomenclatureCode>,
}

impl FounderRecord {
    pub fn new(profile: AlleleProfile, code: NomenclatureCode) -> Self {
        FounderRecord {
            profile,
            code,
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<NomenclatureCode>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn sample(&self) -> &str {
        &self.profile.sample
    }

    ///
    /// Move the record to `new_code`, retiring its current code as an alias.
    /// Returns the retired code.
    ///
    pub fn recode(&mut self, new_code: NomenclatureCode) -> NomenclatureCode {
        let old = std::mem::replace(&mut self.code, new_code);
        if !self.aliases.contains(&old) {
            self.aliases.push(old.clone());
        }
        old
    }

    /// Whether `code` is the current code or one of the retired aliases.
    pub fn answers_to(&self, code: &NomenclatureCode) -> bool {
        &self.code == code || self.aliases.contains(code)
    }
}

impl Display for FounderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.sample(), self.code)
    }
}

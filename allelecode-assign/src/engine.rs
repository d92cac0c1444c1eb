use std::collections::BTreeSet;
use std::fmt::{self, Display};

use fxhash::FxHashMap;
use log::{debug, warn};

use allelecode_core::Hierarchy;
use allelecode_core::distance;
use allelecode_core::errors::{DataIntegrityError, DistanceError};
use allelecode_core::models::{AlleleProfile, FounderRecord, NomenclatureCode};
use allelecode_store::store::IntegrityResult;
use allelecode_store::{ChangeLogEntry, ChangeReason, FounderStore, RecordId};

use crate::merge::{ReassessQueue, merge_branches, reassess};
use crate::qc::{PartialProfileWarning, check_presence};

/// What happened to a profile at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelDecision {
    /// exactly one branch had a record within threshold
    Retain(u32),
    /// no record within threshold; a new branch was opened
    NewBranch(u32),
    /// `merged` branches were within threshold and became `survivor`
    Merge { survivor: u32, merged: usize },
}

impl LevelDecision {
    pub fn branch(&self) -> u32 {
        match self {
            LevelDecision::Retain(branch) | LevelDecision::NewBranch(branch) => *branch,
            LevelDecision::Merge { survivor, .. } => *survivor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentStatus {
    /// inserted into the store as a new founder
    NewFounder,
    /// identical to `founder`, which already carries the code
    Duplicate { founder: String },
    /// the sample is a founder already and keeps its stored code
    AlreadyNamed,
    /// no core locus was called
    Unassignable,
}

///
/// Result of assigning one profile.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub sample: String,
    pub code: Option<NomenclatureCode>,
    pub status: AssignmentStatus,
    /// one decision per level, empty unless the code was computed in this run
    pub decisions: Vec<LevelDecision>,
    pub warning: Option<PartialProfileWarning>,
}

impl Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}\t{}", self.sample, code),
            None => write!(f, "{}\t-", self.sample),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub profiles: usize,
    pub distances: usize,
    pub merges: usize,
    pub founders_added: usize,
    pub duplicates: usize,
    pub already_named: usize,
    pub unassignable: usize,
    pub partial: usize,
}

impl Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} profiles: {} new founders, {} duplicates, {} already named, {} unassignable ({} partial); {} merges, {} distances computed",
            self.profiles,
            self.founders_added,
            self.duplicates,
            self.already_named,
            self.unassignable,
            self.partial,
            self.merges,
            self.distances
        )
    }
}

/// Everything a run produced: the updated store and what changed in it.
#[derive(Debug)]
pub struct RunOutcome {
    pub store: FounderStore,
    pub assignments: Vec<Assignment>,
    pub changes: Vec<ChangeLogEntry>,
    pub stats: RunStats,
}

///
/// Assigns nomenclature codes to profiles, one at a time, against a
/// [`FounderStore`] that is threaded through every call.
///
pub struct AssignmentEngine<'h> {
    hierarchy: &'h Hierarchy,
    stats: RunStats,
}

impl<'h> AssignmentEngine<'h> {
    pub fn new(hierarchy: &'h Hierarchy) -> Self {
        AssignmentEngine {
            hierarchy,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    ///
    /// Walk `profile` down the hierarchy and give it a code.
    ///
    /// At each level the records under the current prefix within that level's
    /// threshold are grouped by branch: no branch opens a new one, one branch
    /// is retained and several are merged (the merge and any reassessment it
    /// triggers are applied to `store` before the walk continues). A profile
    /// identical to a founder of the resolved code takes that code without
    /// being stored; any other profile becomes a founder.
    ///
    /// # Arguments
    /// - store: founder pool of the hierarchy's prefix
    /// - profile: profile aligned to the store's loci
    /// - changes: renames caused by this profile are appended here
    ///
    pub fn assign(
        &mut self,
        store: &mut FounderStore,
        profile: &AlleleProfile,
        changes: &mut Vec<ChangeLogEntry>,
    ) -> IntegrityResult<Assignment> {
        if profile.len() != store.loci().len() {
            return Err(DataIntegrityError::ProfileWidth {
                sample: profile.sample.clone(),
                found: profile.len(),
                expected: store.loci().len(),
            });
        }

        let hierarchy = self.hierarchy;
        self.stats.profiles += 1;

        let warning = check_presence(profile, hierarchy.min_presence());
        if let Some(warning) = &warning {
            self.stats.partial += 1;
            warn!("{}", warning);
        }

        let mut assignment = Assignment {
            sample: profile.sample.clone(),
            code: None,
            status: AssignmentStatus::Unassignable,
            decisions: Vec::with_capacity(hierarchy.depth()),
            warning,
        };

        if let Some(id) = store.find_sample(&profile.sample) {
            let code = store.record(id)?.code.clone();
            debug!("{} is already named {}", profile.sample, code);
            self.stats.already_named += 1;
            assignment.code = Some(code);
            assignment.status = AssignmentStatus::AlreadyNamed;
            return Ok(assignment);
        }

        if profile.called_loci() == 0 {
            warn!("{} has no called core loci and cannot be assigned", profile.sample);
            self.stats.unassignable += 1;
            return Ok(assignment);
        }

        let mut cache = FxHashMap::default();
        let mut prefix: Vec<u32> = Vec::with_capacity(hierarchy.depth());

        for (level, threshold) in hierarchy.thresholds().into_iter().enumerate() {
            let mut branches = BTreeSet::new();
            for id in store.query(level, &prefix)? {
                if let Some(d) = self.distance(store, &mut cache, profile, id)? {
                    if d <= threshold {
                        branches.insert(store.record(id)?.code.parts()[level]);
                    }
                }
            }

            let mut within = branches.iter().copied();
            let decision = match (within.next(), within.next()) {
                (None, _) => LevelDecision::NewBranch(store.next_branch(&prefix)),
                (Some(branch), None) => LevelDecision::Retain(branch),
                (Some(_), Some(_)) => {
                    self.stats.merges += 1;
                    let mut queue = ReassessQueue::new();
                    let survivor = merge_branches(
                        store,
                        &prefix,
                        &branches,
                        ChangeReason::Merge,
                        changes,
                        &mut queue,
                    )?;
                    reassess(store, hierarchy, &mut queue, changes, &mut self.stats)?;
                    LevelDecision::Merge {
                        survivor,
                        merged: branches.len(),
                    }
                }
            };

            prefix.push(decision.branch());
            assignment.decisions.push(decision);
        }

        let code = NomenclatureCode::new(prefix);
        for id in store.query(hierarchy.depth(), code.parts())? {
            if self.distance(store, &mut cache, profile, id)? == Some(0) {
                let founder = store.record(id)?.sample().to_string();
                debug!("{} is identical to founder {} ({})", profile.sample, founder, code);
                self.stats.duplicates += 1;
                assignment.code = Some(code);
                assignment.status = AssignmentStatus::Duplicate { founder };
                return Ok(assignment);
            }
        }

        store.insert(FounderRecord::new(profile.clone(), code.clone()))?;
        debug!("{} founds {}", profile.sample, code);
        self.stats.founders_added += 1;
        assignment.code = Some(code);
        assignment.status = AssignmentStatus::NewFounder;

        Ok(assignment)
    }

    ///
    /// Assign every profile in order. The store is consumed and handed back
    /// with the outcome; an integrity error aborts the run and drops it.
    ///
    pub fn run(self, store: FounderStore, profiles: &[AlleleProfile]) -> IntegrityResult<RunOutcome> {
        self.run_with(store, profiles, |_| {})
    }

    ///
    /// Like [`run`](Self::run), calling `on_assigned` after each profile.
    ///
    pub fn run_with<F>(
        mut self,
        mut store: FounderStore,
        profiles: &[AlleleProfile],
        mut on_assigned: F,
    ) -> IntegrityResult<RunOutcome>
    where
        F: FnMut(&Assignment),
    {
        let mut changes = Vec::new();
        let mut assignments = Vec::with_capacity(profiles.len());

        for profile in profiles {
            let assignment = self.assign(&mut store, profile, &mut changes)?;
            on_assigned(&assignment);
            assignments.push(assignment);
        }

        Ok(RunOutcome {
            store,
            assignments,
            changes,
            stats: self.stats,
        })
    }

    /// Distance to a record, `None` when beyond the coarsest threshold or
    /// without shared loci. Thresholds never grow with depth, so a record out
    /// of reach at one level stays out of reach below it.
    fn distance(
        &mut self,
        store: &FounderStore,
        cache: &mut FxHashMap<RecordId, Option<u32>>,
        profile: &AlleleProfile,
        id: RecordId,
    ) -> IntegrityResult<Option<u32>> {
        if let Some(&known) = cache.get(&id) {
            return Ok(known);
        }

        let record = store.record(id)?;
        let limit = self.hierarchy.threshold(0).unwrap_or_default();
        self.stats.distances += 1;

        let d = match distance::compute_within(profile, &record.profile, limit) {
            Ok(d) => d,
            Err(DistanceError::InsufficientOverlap) => None,
            Err(DistanceError::LengthMismatch(found, expected)) => {
                return Err(DataIntegrityError::ProfileWidth {
                    sample: profile.sample.clone(),
                    found,
                    expected,
                });
            }
        };

        cache.insert(id, d);
        Ok(d)
    }
}

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{self, Display};

use fxhash::FxHashMap;

use allelecode_core::Hierarchy;
use allelecode_core::errors::DataIntegrityError;
use allelecode_core::models::code::format_prefix;
use allelecode_core::models::{FounderRecord, NomenclatureCode};

/// Position of a record inside a [`FounderStore`]. Records are never removed,
/// so an id stays valid for the lifetime of the store.
pub type RecordId = usize;

pub type IntegrityResult<T> = std::result::Result<T, DataIntegrityError>;

///
/// All founders of one nomenclature prefix, indexed by ancestor prefix.
///
/// Two indexes are kept next to the record list:
///
/// - `members` maps every ancestor prefix (all lengths from the empty root
///   prefix to a full code) to the records below it, which is what a
///   `(level, parent)` query reads;
/// - `branches` is the branch registry: parent prefix to the branch integers
///   handed out under it. It is persisted with the snapshot and is the source
///   of new branch numbers.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FounderStore {
    prefix: String,
    depth: usize,
    loci: Vec<String>,
    records: Vec<FounderRecord>,
    samples: FxHashMap<String, RecordId>,
    members: BTreeMap<Vec<u32>, BTreeSet<RecordId>>,
    branches: BTreeMap<Vec<u32>, BTreeSet<u32>>,
}

impl FounderStore {
    pub fn new(prefix: impl Into<String>, depth: usize, loci: Vec<String>) -> Self {
        FounderStore {
            prefix: prefix.into(),
            depth,
            loci,
            records: Vec::new(),
            samples: FxHashMap::default(),
            members: BTreeMap::new(),
            branches: BTreeMap::new(),
        }
    }

    /// An empty store shaped after `hierarchy`.
    pub fn for_hierarchy(hierarchy: &Hierarchy) -> Self {
        FounderStore::new(
            hierarchy.prefix(),
            hierarchy.depth(),
            hierarchy.loci().to_vec(),
        )
    }

    ///
    /// Rebuild a store from persisted parts: the records plus the branch
    /// registry as `(parent, children)` pairs. The registry is taken as
    /// stored rather than derived from the codes, and the result is
    /// validated.
    ///
    /// # Arguments
    /// - prefix: organism prefix
    /// - depth: number of hierarchy levels
    /// - loci: locus order of the record profiles
    /// - records: founder records
    /// - registry: branch integers per parent prefix
    ///
    pub fn from_parts(
        prefix: impl Into<String>,
        depth: usize,
        loci: Vec<String>,
        records: Vec<FounderRecord>,
        registry: Vec<(Vec<u32>, Vec<u32>)>,
    ) -> IntegrityResult<Self> {
        let mut store = FounderStore::new(prefix, depth, loci);

        for (parent, children) in registry {
            let registered = store.branches.entry(parent.clone()).or_default();
            for child in children {
                if !registered.insert(child) {
                    return Err(DataIntegrityError::DuplicateSibling {
                        parent: format_prefix(&parent),
                        branch: child,
                    });
                }
            }
        }

        for record in records {
            store.push_record(record)?;
        }

        store.validate()?;
        Ok(store)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn loci(&self) -> &[String] {
        &self.loci
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &FounderRecord> + '_ {
        self.records.iter()
    }

    pub fn get(&self, id: RecordId) -> Option<&FounderRecord> {
        self.records.get(id)
    }

    /// Like [`FounderStore::get`], but an unknown id is an integrity error.
    pub fn record(&self, id: RecordId) -> IntegrityResult<&FounderRecord> {
        self.records
            .get(id)
            .ok_or(DataIntegrityError::UnknownRecord(id))
    }

    pub fn find_sample(&self, sample: &str) -> Option<RecordId> {
        self.samples.get(sample).copied()
    }

    ///
    /// Records whose code starts with `parent`, in insertion order.
    ///
    /// # Arguments
    /// - level: hierarchy level being decided; `parent` must have exactly
    ///   `level` integers
    /// - parent: ancestor prefix
    ///
    pub fn query(&self, level: usize, parent: &[u32]) -> IntegrityResult<Vec<RecordId>> {
        if parent.len() != level {
            return Err(DataIntegrityError::PrefixLength {
                level,
                found: parent.len(),
            });
        }
        Ok(self.members_of(parent).collect())
    }

    fn members_of(&self, prefix: &[u32]) -> impl Iterator<Item = RecordId> + '_ {
        self.members
            .get(prefix)
            .into_iter()
            .flat_map(|ids| ids.iter().copied())
    }

    /// Number of records below `prefix`.
    pub fn group_size(&self, prefix: &[u32]) -> usize {
        self.members.get(prefix).map_or(0, |ids| ids.len())
    }

    /// Registered branch integers under `parent`, ascending.
    pub fn siblings(&self, parent: &[u32]) -> Vec<u32> {
        self.branches
            .get(parent)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Integer for a new branch under `parent`: largest sibling + 1, or 1.
    pub fn next_branch(&self, parent: &[u32]) -> u32 {
        self.branches
            .get(parent)
            .and_then(|children| children.last().copied())
            .map_or(1, |max| max + 1)
    }

    ///
    /// Add a founder. Its code must have one positive integer per level; every
    /// branch along the code is registered.
    ///
    pub fn insert(&mut self, record: FounderRecord) -> IntegrityResult<RecordId> {
        let code = record.code.clone();
        let id = self.push_record(record)?;
        self.register(code.parts());
        Ok(id)
    }

    ///
    /// Move every record below `old` to `new`, rewriting the leading segment
    /// of their codes. Each moved record keeps its previous full code as an
    /// alias. Registered sub-branches of `old` move along with it.
    ///
    /// Renaming into an occupied prefix is only allowed at the deepest level;
    /// above it the sub-branch integers of the two groups could collide.
    ///
    /// # Returns
    /// The ids of the moved records, ascending.
    ///
    pub fn rename(&mut self, old: &[u32], new: &[u32]) -> IntegrityResult<Vec<RecordId>> {
        if old.len() != new.len() || old.is_empty() || old.len() > self.depth {
            return Err(DataIntegrityError::RenameDepth {
                old: format_prefix(old),
                new: format_prefix(new),
            });
        }
        if old == new {
            return Ok(Vec::new());
        }

        let moved: Vec<RecordId> = self.members_of(old).collect();
        if moved.is_empty() {
            return Err(DataIntegrityError::EmptyBranch(format_prefix(old)));
        }
        if old.len() < self.depth && self.group_size(new) > 0 {
            return Err(DataIntegrityError::RenameCollision {
                old: format_prefix(old),
                new: format_prefix(new),
            });
        }

        for &id in &moved {
            let old_code = self.records[id].code.clone();
            let new_code = old_code.with_prefix(new);
            self.unindex(id, &old_code);
            self.index(id, &new_code);
            self.records[id].recode(new_code);
        }

        // registry entries at and below `old` move under `new`
        let nested: Vec<Vec<u32>> = self
            .branches
            .range(old.to_vec()..)
            .take_while(|(key, _)| key.starts_with(old))
            .map(|(key, _)| key.clone())
            .collect();
        for key in nested {
            if let Some(children) = self.branches.remove(&key) {
                let moved_key = [new, &key[old.len()..]].concat();
                self.branches.entry(moved_key).or_default().extend(children);
            }
        }

        self.register(new);
        self.prune(old);

        Ok(moved)
    }

    ///
    /// Check the store for corrupt state: duplicate samples, codes of the
    /// wrong depth or with a zero branch, profiles of the wrong width, records
    /// on unregistered branches and registered branches without members.
    ///
    pub fn validate(&self) -> IntegrityResult<()> {
        if self.samples.len() != self.records.len() {
            let mut seen = HashSet::with_capacity(self.records.len());
            for record in &self.records {
                if !seen.insert(record.sample()) {
                    return Err(DataIntegrityError::DuplicateSample(record.sample().to_string()));
                }
            }
        }

        for record in &self.records {
            self.check_record(record)?;
            for level in 0..self.depth {
                let parent = record.code.prefix(level);
                let branch = record.code.parts()[level];
                let registered = self
                    .branches
                    .get(parent)
                    .is_some_and(|children| children.contains(&branch));
                if !registered {
                    return Err(DataIntegrityError::UnregisteredBranch {
                        sample: record.sample().to_string(),
                        prefix: format_prefix(record.code.prefix(level + 1)),
                    });
                }
            }
        }

        for (parent, children) in &self.branches {
            for &child in children {
                let branch = [parent.as_slice(), &[child]].concat();
                if parent.len() >= self.depth || self.group_size(&branch) == 0 {
                    return Err(DataIntegrityError::EmptyBranch(format_prefix(&branch)));
                }
            }
        }

        Ok(())
    }

    /// Branch registry as `(parent, children)` pairs, both ascending.
    pub fn registry(&self) -> Vec<(Vec<u32>, Vec<u32>)> {
        self.branches
            .iter()
            .map(|(parent, children)| (parent.clone(), children.iter().copied().collect()))
            .collect()
    }

    /// Number of registered branches at each level.
    pub fn branch_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.depth];
        for (parent, children) in &self.branches {
            if let Some(count) = counts.get_mut(parent.len()) {
                *count += children.len();
            }
        }
        counts
    }

    fn check_record(&self, record: &FounderRecord) -> IntegrityResult<()> {
        if record.code.depth() != self.depth {
            return Err(DataIntegrityError::CodeDepth {
                sample: record.sample().to_string(),
                code: record.code.to_string(),
                found: record.code.depth(),
                expected: self.depth,
            });
        }
        if record.code.has_zero_branch() {
            return Err(DataIntegrityError::ZeroBranch {
                sample: record.sample().to_string(),
                code: record.code.to_string(),
            });
        }
        if record.profile.len() != self.loci.len() {
            return Err(DataIntegrityError::ProfileWidth {
                sample: record.sample().to_string(),
                found: record.profile.len(),
                expected: self.loci.len(),
            });
        }
        Ok(())
    }

    fn push_record(&mut self, record: FounderRecord) -> IntegrityResult<RecordId> {
        self.check_record(&record)?;
        if self.samples.contains_key(record.sample()) {
            return Err(DataIntegrityError::DuplicateSample(record.sample().to_string()));
        }

        let id = self.records.len();
        let code = record.code.clone();
        self.samples.insert(record.sample().to_string(), id);
        self.records.push(record);
        self.index(id, &code);

        Ok(id)
    }

    fn index(&mut self, id: RecordId, code: &NomenclatureCode) {
        for len in 0..=code.depth() {
            self.members
                .entry(code.prefix(len).to_vec())
                .or_default()
                .insert(id);
        }
    }

    fn unindex(&mut self, id: RecordId, code: &NomenclatureCode) {
        for len in 0..=code.depth() {
            let prefix = code.prefix(len);
            if let Some(ids) = self.members.get_mut(prefix) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.members.remove(prefix);
                }
            }
        }
    }

    fn register(&mut self, prefix: &[u32]) {
        for level in 0..prefix.len() {
            self.branches
                .entry(prefix[..level].to_vec())
                .or_default()
                .insert(prefix[level]);
        }
    }

    /// Unregister `prefix` and its ancestors for as long as they are empty.
    fn prune(&mut self, prefix: &[u32]) {
        let mut current = prefix.to_vec();
        while let Some(branch) = current.pop() {
            let mut branch_prefix = current.clone();
            branch_prefix.push(branch);
            if self.group_size(&branch_prefix) > 0 {
                break;
            }

            self.branches.remove(&branch_prefix);
            if let Some(children) = self.branches.get_mut(&current) {
                children.remove(&branch);
                if children.is_empty() {
                    self.branches.remove(&current);
                }
            }
        }
    }
}

impl Display for FounderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FounderStore ({}):", self.prefix)?;
        writeln!(f, ">Founders: {}", self.records.len())?;
        writeln!(f, ">Loci: {}", self.loci.len())?;
        for (level, count) in self.branch_counts().iter().enumerate() {
            writeln!(f, ">Level {}: {} branches", level, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use allelecode_core::models::AlleleProfile;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn loci() -> Vec<String> {
        vec!["L1".to_string(), "L2".to_string()]
    }

    fn record(sample: &str, code: &str) -> FounderRecord {
        let profile = AlleleProfile::new(sample, vec![Some(1), Some(2)]);
        FounderRecord::new(profile, code.parse().unwrap())
    }

    #[fixture]
    fn store() -> FounderStore {
        let mut store = FounderStore::new("TEST", 3, loci());
        for (sample, code) in [
            ("A", "1.1.1"),
            ("B", "1.1.2"),
            ("C", "1.2.1"),
            ("D", "1.2.1"),
            ("E", "2.1.1"),
        ] {
            store.insert(record(sample, code)).unwrap();
        }
        store
    }

    fn samples(store: &FounderStore, ids: &[RecordId]) -> Vec<String> {
        ids.iter()
            .map(|&id| store.get(id).unwrap().sample().to_string())
            .collect()
    }

    #[rstest]
    fn test_query_by_level_and_prefix(store: FounderStore) {
        assert_eq!(store.query(0, &[]).unwrap().len(), 5);
        assert_eq!(samples(&store, &store.query(1, &[1]).unwrap()), vec!["A", "B", "C", "D"]);
        assert_eq!(samples(&store, &store.query(2, &[1, 2]).unwrap()), vec!["C", "D"]);
        assert!(store.query(2, &[3, 1]).unwrap().is_empty());
    }

    #[rstest]
    fn test_query_rejects_wrong_prefix_length(store: FounderStore) {
        assert_eq!(
            store.query(2, &[1]),
            Err(DataIntegrityError::PrefixLength { level: 2, found: 1 })
        );
    }

    #[rstest]
    fn test_siblings_and_next_branch(store: FounderStore) {
        assert_eq!(store.siblings(&[]), vec![1, 2]);
        assert_eq!(store.siblings(&[1]), vec![1, 2]);
        assert_eq!(store.next_branch(&[]), 3);
        assert_eq!(store.next_branch(&[1, 1]), 3);
        assert_eq!(store.next_branch(&[7]), 1);
    }

    #[rstest]
    fn test_insert_rejects_bad_records(mut store: FounderStore) {
        assert!(matches!(
            store.insert(record("A", "3.1.1")),
            Err(DataIntegrityError::DuplicateSample(_))
        ));
        assert!(matches!(
            store.insert(record("X", "3.1")),
            Err(DataIntegrityError::CodeDepth { found: 2, expected: 3, .. })
        ));

        let wide = AlleleProfile::new("Y", vec![Some(1); 3]);
        assert!(matches!(
            store.insert(FounderRecord::new(wide, "3.1.1".parse().unwrap())),
            Err(DataIntegrityError::ProfileWidth { found: 3, expected: 2, .. })
        ));
    }

    #[rstest]
    fn test_rename_terminal_group_into_occupied_branch(mut store: FounderStore) {
        let moved = store.rename(&[1, 1, 2], &[1, 1, 1]).unwrap();

        assert_eq!(samples(&store, &moved), vec!["B"]);
        let b = store.get(store.find_sample("B").unwrap()).unwrap();
        assert_eq!(b.code.to_string(), "1.1.1");
        assert_eq!(b.aliases, vec!["1.1.2".parse().unwrap()]);
        assert_eq!(store.siblings(&[1, 1]), vec![1]);
        assert_eq!(store.group_size(&[1, 1, 1]), 2);
        store.validate().unwrap();
    }

    #[rstest]
    fn test_rename_non_terminal_group_moves_sub_branches(mut store: FounderStore) {
        let moved = store.rename(&[1, 2], &[2, 2]).unwrap();

        assert_eq!(samples(&store, &moved), vec!["C", "D"]);
        assert_eq!(store.siblings(&[1]), vec![1]);
        assert_eq!(store.siblings(&[2]), vec![1, 2]);
        assert_eq!(store.siblings(&[2, 2]), vec![1]);
        assert!(store.siblings(&[1, 2]).is_empty());
        store.validate().unwrap();
    }

    #[rstest]
    fn test_rename_into_occupied_non_terminal_branch_is_rejected(mut store: FounderStore) {
        assert!(matches!(
            store.rename(&[1, 2], &[1, 1]),
            Err(DataIntegrityError::RenameCollision { .. })
        ));
        assert!(matches!(
            store.rename(&[1, 2], &[1]),
            Err(DataIntegrityError::RenameDepth { .. })
        ));
    }

    #[rstest]
    fn test_rename_prunes_emptied_ancestors(mut store: FounderStore) {
        store.rename(&[2, 1, 1], &[1, 1, 1]).unwrap();

        assert_eq!(store.siblings(&[]), vec![1]);
        assert!(store.siblings(&[2]).is_empty());
        assert_eq!(store.next_branch(&[]), 2);
        store.validate().unwrap();
    }

    #[rstest]
    fn test_rename_keeps_member_count(mut store: FounderStore) {
        let before = store.group_size(&[1]);
        store.rename(&[1, 1, 2], &[1, 1, 1]).unwrap();
        store.rename(&[1, 2], &[1, 3]).unwrap();

        assert_eq!(store.group_size(&[1]), before);
        assert_eq!(store.len(), 5);
    }

    #[rstest]
    fn test_from_parts_detects_duplicate_siblings() {
        let registry = vec![(vec![], vec![1]), (vec![1], vec![1, 1])];
        let result = FounderStore::from_parts("TEST", 2, loci(), vec![record("A", "1.1")], registry);

        assert_eq!(
            result,
            Err(DataIntegrityError::DuplicateSibling {
                parent: "1".to_string(),
                branch: 1
            })
        );
    }

    #[rstest]
    fn test_from_parts_detects_unregistered_and_empty_branches() {
        let unregistered = FounderStore::from_parts(
            "TEST",
            2,
            loci(),
            vec![record("A", "1.1")],
            vec![(vec![], vec![1])],
        );
        assert!(matches!(
            unregistered,
            Err(DataIntegrityError::UnregisteredBranch { .. })
        ));

        let empty = FounderStore::from_parts(
            "TEST",
            2,
            loci(),
            vec![record("A", "1.1")],
            vec![(vec![], vec![1, 2]), (vec![1], vec![1])],
        );
        assert_eq!(empty, Err(DataIntegrityError::EmptyBranch("2".to_string())));
    }

    #[rstest]
    fn test_registry_round_trip(store: FounderStore) {
        let records: Vec<FounderRecord> = store.records().cloned().collect();
        let rebuilt =
            FounderStore::from_parts("TEST", 3, loci(), records, store.registry()).unwrap();

        assert_eq!(rebuilt, store);
        assert_eq!(rebuilt.branch_counts(), vec![2, 3, 4]);
    }
}

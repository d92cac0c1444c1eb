//! Branch merges and the reassessment work queue.
//!
//! When a profile is within threshold of several branches at one level,
//! those branches become one. Records moved by a merge can in turn bridge
//! branches one level deeper; such follow-up merges are found by draining a
//! FIFO queue of `(record, level)` items.

use std::collections::{BTreeSet, VecDeque};

use log::debug;

use allelecode_core::Hierarchy;
use allelecode_core::distance;
use allelecode_core::models::code::format_prefix;
use allelecode_store::store::IntegrityResult;
use allelecode_store::{ChangeLogEntry, ChangeReason, FounderStore, RecordId};

use crate::engine::RunStats;

/// Records waiting to be reassessed, each at the level it entered a new group.
pub type ReassessQueue = VecDeque<(RecordId, usize)>;

///
/// The branch that survives a merge: the one with the most records, the
/// lowest integer among equally large ones.
///
pub fn pick_survivor(store: &FounderStore, parent: &[u32], branches: &BTreeSet<u32>) -> Option<u32> {
    branches.iter().copied().max_by(|a, b| {
        let size_a = store.group_size(&[parent, &[*a]].concat());
        let size_b = store.group_size(&[parent, &[*b]].concat());
        size_a.cmp(&size_b).then(b.cmp(a))
    })
}

///
/// Merge `branches` (all under `parent`) into their survivor.
///
/// At the deepest level a merged branch is renamed onto the survivor. Above
/// it, every sub-branch of a merged branch moves to a fresh integer under the
/// survivor, in ascending order, and its records are queued for reassessment
/// one level down. Each rename produces one change log entry.
///
/// # Returns
/// The surviving branch integer.
///
pub fn merge_branches(
    store: &mut FounderStore,
    parent: &[u32],
    branches: &BTreeSet<u32>,
    reason: ChangeReason,
    changes: &mut Vec<ChangeLogEntry>,
    queue: &mut ReassessQueue,
) -> IntegrityResult<u32> {
    let level = parent.len();
    let Some(survivor) = pick_survivor(store, parent, branches) else {
        return Ok(store.next_branch(parent));
    };
    let survivor_prefix = [parent, &[survivor]].concat();
    let terminal = level + 1 == store.depth();

    for &merged in branches.iter().filter(|&&b| b != survivor) {
        let merged_prefix = [parent, &[merged]].concat();

        if terminal {
            let moved = store.rename(&merged_prefix, &survivor_prefix)?;
            log_rename(store, &merged_prefix, &survivor_prefix, reason, level, &moved, changes);
            continue;
        }

        for child in store.siblings(&merged_prefix) {
            let from = [merged_prefix.as_slice(), &[child]].concat();
            let to = [survivor_prefix.as_slice(), &[store.next_branch(&survivor_prefix)]].concat();
            let moved = store.rename(&from, &to)?;
            log_rename(store, &from, &to, reason, level, &moved, changes);
            queue.extend(moved.into_iter().map(|id| (id, level + 1)));
        }
    }

    Ok(survivor)
}

fn log_rename(
    store: &FounderStore,
    old: &[u32],
    new: &[u32],
    reason: ChangeReason,
    level: usize,
    moved: &[RecordId],
    changes: &mut Vec<ChangeLogEntry>,
) {
    let samples: Vec<String> = moved
        .iter()
        .filter_map(|&id| store.get(id))
        .map(|record| record.sample().to_string())
        .collect();

    let entry = ChangeLogEntry::new(format_prefix(old), format_prefix(new), reason, level, samples);
    debug!("{}", entry);
    changes.push(entry);
}

///
/// Drain the reassessment queue. For each item the record's current code is
/// re-read; the branches at that level holding a record within threshold of
/// it are merged with its own branch. Records moved by such a merge join the
/// back of the queue.
///
pub fn reassess(
    store: &mut FounderStore,
    hierarchy: &Hierarchy,
    queue: &mut ReassessQueue,
    changes: &mut Vec<ChangeLogEntry>,
    stats: &mut RunStats,
) -> IntegrityResult<()> {
    while let Some((id, level)) = queue.pop_front() {
        let Some(threshold) = hierarchy.threshold(level) else {
            continue;
        };

        let record = store.record(id)?;
        let parent = record.code.prefix(level).to_vec();
        let mut branches = BTreeSet::from([record.code.parts()[level]]);

        for other_id in store.query(level, &parent)? {
            if other_id == id {
                continue;
            }
            let other = store.record(other_id)?;
            let other_branch = other.code.parts()[level];
            if branches.contains(&other_branch) {
                continue;
            }

            stats.distances += 1;
            if let Ok(Some(_)) = distance::compute_within(&record.profile, &other.profile, threshold) {
                branches.insert(other_branch);
            }
        }

        if branches.len() > 1 {
            debug!(
                "Reassessing {} at level {} bridges branches {:?} under `{}`",
                record.sample(),
                level,
                branches,
                format_prefix(&parent)
            );
            stats.merges += 1;
            merge_branches(store, &parent, &branches, ChangeReason::Reassessment, changes, queue)?;
        }
    }

    Ok(())
}

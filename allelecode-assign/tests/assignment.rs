//! End-to-end assignment runs: engine, store and persistence together.

use std::path::PathBuf;

use allelecode_assign::results::result_rows;
use allelecode_assign::{AssignmentEngine, AssignmentStatus, LevelDecision, XcodeList};
use allelecode_core::models::{AlleleProfile, NomenclatureCode};
use allelecode_core::utils::read_profile_table;
use allelecode_core::{Hierarchy, ThresholdLevel, load_hierarchy};
use allelecode_store::{ChangeReason, FounderStore, StoreLayout, load_store, save_store};
use pretty_assertions::assert_eq;
use rstest::*;
use tempfile::tempdir;

fn hierarchy(n_loci: usize, thresholds: &[u32]) -> Hierarchy {
    let levels = thresholds
        .iter()
        .enumerate()
        .map(|(level, &threshold)| ThresholdLevel { level, threshold })
        .collect();
    let loci = (1..=n_loci).map(|i| format!("L{}", i)).collect();
    Hierarchy::new("TEST", levels, loci, 0.95).unwrap()
}

fn profile(sample: &str, calls: &[u32]) -> AlleleProfile {
    AlleleProfile::new(sample, calls.iter().map(|&c| Some(c)).collect())
}

fn code_of(store: &FounderStore, sample: &str) -> String {
    let id = store.find_sample(sample).unwrap();
    store.get(id).unwrap().code.to_string()
}

fn get_test_path(file_name: &str) -> PathBuf {
    PathBuf::from("../tests/data/allelecode").join(file_name)
}

#[rstest]
fn test_bridging_profile_merges_two_branches() {
    let h = hierarchy(4, &[10, 2]);
    let founders = vec![profile("A", &[1, 1, 1, 1]), profile("B", &[2, 2, 2, 2])];
    let seeded = AssignmentEngine::new(&h)
        .run(FounderStore::for_hierarchy(&h), &founders)
        .unwrap();

    assert_eq!(code_of(&seeded.store, "A"), "1.1");
    assert_eq!(code_of(&seeded.store, "B"), "1.2");
    assert!(seeded.changes.is_empty());

    let outcome = AssignmentEngine::new(&h)
        .run(seeded.store, &[profile("N", &[1, 1, 2, 2])])
        .unwrap();
    let store = &outcome.store;

    assert_eq!(outcome.changes.len(), 1);
    let change = &outcome.changes[0];
    assert_eq!((change.old.as_str(), change.new.as_str()), ("1.2", "1.1"));
    assert_eq!(change.samples, vec!["B".to_string()]);
    assert_eq!(change.reason, ChangeReason::Merge);
    assert_eq!(change.level, 1);

    let n = &outcome.assignments[0];
    assert_eq!(n.code.as_ref().unwrap().to_string(), "1.1");
    assert_eq!(
        n.decisions,
        vec![
            LevelDecision::Retain(1),
            LevelDecision::Merge {
                survivor: 1,
                merged: 2
            }
        ]
    );

    for sample in ["A", "B", "N"] {
        assert_eq!(code_of(store, sample), "1.1");
    }
    let b = store.get(store.find_sample("B").unwrap()).unwrap();
    assert_eq!(b.aliases, vec!["1.2".parse::<NomenclatureCode>().unwrap()]);

    // the merge moved records between branches without losing any
    assert_eq!(store.group_size(&[1]), 3);
    assert_eq!(store.siblings(&[1]), vec![1]);
    store.validate().unwrap();
}

#[rstest]
fn test_distant_profile_opens_new_top_level_branch() {
    let h = hierarchy(12, &[10, 2]);
    let profiles = vec![profile("A", &[1; 12]), profile("F", &[2; 12])];

    let outcome = AssignmentEngine::new(&h)
        .run(FounderStore::for_hierarchy(&h), &profiles)
        .unwrap();

    let f = &outcome.assignments[1];
    assert_eq!(f.code.as_ref().unwrap().to_string(), "2.1");
    assert_eq!(
        f.decisions,
        vec![LevelDecision::NewBranch(2), LevelDecision::NewBranch(1)]
    );
    assert!(outcome.changes.is_empty());
}

#[rstest]
fn test_top_level_merge_renumbers_and_reports() {
    let h = hierarchy(4, &[3, 1, 0]);
    let profiles = vec![
        profile("A", &[1, 1, 1, 1]),
        profile("B", &[1, 1, 1, 2]),
        profile("X", &[5, 5, 5, 5]),
        profile("N", &[1, 1, 5, 5]),
    ];

    let outcome = AssignmentEngine::new(&h)
        .run(FounderStore::for_hierarchy(&h), &profiles)
        .unwrap();
    let store = &outcome.store;

    assert_eq!(code_of(store, "A"), "1.1.1");
    assert_eq!(code_of(store, "B"), "1.1.2");
    assert_eq!(code_of(store, "X"), "1.2.1");
    assert_eq!(code_of(store, "N"), "1.3.1");

    assert_eq!(outcome.changes.len(), 1);
    assert_eq!(outcome.changes[0].old, "2.1");
    assert_eq!(outcome.changes[0].new, "1.2");
    assert_eq!(outcome.changes[0].level, 0);
    assert_eq!(outcome.stats.merges, 1);
    assert_eq!(store.siblings(&[]), vec![1]);
    store.validate().unwrap();
}

#[rstest]
fn test_codes_always_span_every_level() {
    let h = hierarchy(6, &[4, 2, 1]);
    let profiles: Vec<AlleleProfile> = (0..20u32)
        .map(|i| {
            let calls: Vec<u32> = (0..6u32).map(|locus| 1 + (i * (locus + 1)) % 3).collect();
            profile(&format!("S{}", i), &calls)
        })
        .collect();

    let outcome = AssignmentEngine::new(&h)
        .run(FounderStore::for_hierarchy(&h), &profiles)
        .unwrap();

    for assignment in &outcome.assignments {
        assert_eq!(assignment.code.as_ref().unwrap().depth(), 3);
    }
    for record in outcome.store.records() {
        assert_eq!(record.code.depth(), 3);
    }
    outcome.store.validate().unwrap();
}

#[rstest]
fn test_results_report_codes_after_later_merges() {
    let h = hierarchy(4, &[10, 2]);
    let profiles = vec![
        profile("A", &[1, 1, 1, 1]),
        profile("B", &[1, 3, 3, 3]),
        profile("B2", &[1, 3, 3, 3]),
        profile("N", &[1, 1, 3, 1]),
    ];

    let outcome = AssignmentEngine::new(&h)
        .run(FounderStore::for_hierarchy(&h), &profiles)
        .unwrap();

    // B and its twin B2 were given 1.2 before N bridged 1.1 and 1.2
    assert_eq!(outcome.assignments[1].code.as_ref().unwrap().to_string(), "1.2");
    assert_eq!(
        outcome.assignments[2].status,
        AssignmentStatus::Duplicate {
            founder: "B".to_string()
        }
    );
    assert_eq!(code_of(&outcome.store, "B"), "1.1");

    let rows = result_rows(
        &outcome.assignments,
        &outcome.store,
        &outcome.changes,
        &XcodeList::default(),
    );
    let values: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.sample.as_str(), r.value.as_str()))
        .collect();

    assert_eq!(
        values,
        vec![("A", "1.1"), ("B", "1.1"), ("B2", "1.1"), ("N", "1.1")]
    );
}

#[rstest]
fn test_rerun_without_new_profiles_changes_nothing() {
    let h = hierarchy(4, &[10, 2]);
    let dir = tempdir().unwrap();
    let layout = StoreLayout::new(dir.path(), h.prefix());
    let profiles = vec![
        profile("A", &[1, 1, 1, 1]),
        profile("B", &[2, 2, 2, 2]),
        profile("N", &[1, 1, 2, 2]),
    ];

    let first = AssignmentEngine::new(&h)
        .run(load_store(&layout, &h).unwrap(), &profiles)
        .unwrap();
    save_store(&layout, &first.store, &h, &first.changes, profiles.len()).unwrap();

    let empty_run = AssignmentEngine::new(&h)
        .run(load_store(&layout, &h).unwrap(), &[])
        .unwrap();
    assert!(empty_run.changes.is_empty());
    assert_eq!(empty_run.store, first.store);

    let same_again = AssignmentEngine::new(&h)
        .run(load_store(&layout, &h).unwrap(), &profiles)
        .unwrap();
    assert!(same_again.changes.is_empty());
    assert_eq!(same_again.store, first.store);
    assert!(
        same_again
            .assignments
            .iter()
            .all(|a| a.status == AssignmentStatus::AlreadyNamed)
    );
}

#[rstest]
fn test_table_run_save_and_reload() {
    let scheme = get_test_path("scheme.toml");
    let h = load_hierarchy(scheme.to_str().unwrap(), None).unwrap();
    let table = read_profile_table(&get_test_path("founders.tsv"), h.loci()).unwrap();

    let dir = tempdir().unwrap();
    let layout = StoreLayout::new(dir.path(), h.prefix());
    let outcome = AssignmentEngine::new(&h)
        .run(load_store(&layout, &h).unwrap(), &table.profiles)
        .unwrap();

    let codes: Vec<String> = outcome
        .assignments
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(codes, vec!["A\t1.1", "B\t1.2", "C\t1.3"]);

    save_store(&layout, &outcome.store, &h, &outcome.changes, table.profiles.len()).unwrap();
    let reloaded = load_store(&layout, &h).unwrap();
    assert_eq!(reloaded, outcome.store);
}

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use allelecode_core::errors::TableError;
use allelecode_core::models::NomenclatureCode;
use allelecode_core::utils::table_delimiter;
use allelecode_store::{ChangeLogEntry, FounderStore};

use crate::engine::{Assignment, AssignmentStatus};
use crate::xcodes::XcodeList;

pub const RESULT_HEADER: [&str; 2] = ["Key", "Allele_code"];

/// One line of the result table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub sample: String,
    pub value: String,
}

///
/// Build the result table: one row per processed profile in input order,
/// then the stored founders outside the input whose code changed during the
/// run, by sample name.
///
/// Codes are read from `store` as it stands after the run, so a profile whose
/// branch was merged by a later profile reports the surviving code. Codes are
/// rendered through `xcodes`; partial profiles carry their called locus count.
///
pub fn result_rows(
    assignments: &[Assignment],
    store: &FounderStore,
    changes: &[ChangeLogEntry],
    xcodes: &XcodeList,
) -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = assignments
        .iter()
        .map(|assignment| {
            let value = match current_code(assignment, store) {
                Some(code) => {
                    let rendered = xcodes.render(code);
                    match &assignment.warning {
                        Some(w) => format!("{} (partial: {}/{} loci)", rendered, w.called, w.total),
                        None => rendered,
                    }
                }
                None => "FAILED QC: no called core loci".to_string(),
            };
            ResultRow {
                sample: assignment.sample.clone(),
                value,
            }
        })
        .collect();

    let processed: HashSet<&str> = assignments.iter().map(|a| a.sample.as_str()).collect();
    let changed: BTreeSet<&str> = changes
        .iter()
        .flat_map(|entry| entry.samples.iter().map(String::as_str))
        .filter(|sample| !processed.contains(sample))
        .collect();

    for sample in changed {
        if let Some(record) = store.find_sample(sample).and_then(|id| store.get(id)) {
            rows.push(ResultRow {
                sample: sample.to_string(),
                value: xcodes.render(&record.code),
            });
        }
    }

    rows
}

/// Code of `assignment` in `store` now: its own record, or for a duplicate
/// the record of the founder it matched.
fn current_code<'a>(assignment: &'a Assignment, store: &'a FounderStore) -> Option<&'a NomenclatureCode> {
    let holder = match &assignment.status {
        AssignmentStatus::Unassignable => return None,
        AssignmentStatus::Duplicate { founder } => founder.as_str(),
        AssignmentStatus::NewFounder | AssignmentStatus::AlreadyNamed => assignment.sample.as_str(),
    };

    store
        .find_sample(holder)
        .and_then(|id| store.get(id))
        .map(|record| &record.code)
        .or(assignment.code.as_ref())
}

///
/// Write the result table; `.csv` paths get commas, anything else tabs.
///
pub fn write_results(path: &Path, rows: &[ResultRow]) -> Result<(), TableError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(table_delimiter(path))
        .from_path(path)?;

    writer.write_record(RESULT_HEADER)?;
    for row in rows {
        writer.write_record([row.sample.as_str(), row.value.as_str()])?;
    }
    writer.flush()?;

    Ok(())
}

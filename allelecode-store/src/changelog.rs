//! Append-only record of every code that changed in a run.
//!
//! One TSV file per day under `change_log/`, one row per renamed group,
//! followed by a footer line per run.

use std::fmt::{self, Display};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const CHANGE_LOG_HEADER: &str = "timestamp\told\tnew\treason\tlevel\tsamples";

/// What triggered a rename.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeReason {
    /// a new profile fell within threshold of several branches
    Merge,
    /// a record moved by an earlier merge bridged branches at a deeper level
    Reassessment,
}

impl Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeReason::Merge => write!(f, "merge"),
            ChangeReason::Reassessment => write!(f, "reassessment"),
        }
    }
}

///
/// One renamed group: every listed sample moved from the `old` prefix to the
/// `new` prefix, keeping the deeper levels of its code.
///
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub old: String,
    pub new: String,
    pub reason: ChangeReason,
    pub level: usize,
    pub samples: Vec<String>,
}

impl ChangeLogEntry {
    pub fn new(
        old: impl Into<String>,
        new: impl Into<String>,
        reason: ChangeReason,
        level: usize,
        samples: Vec<String>,
    ) -> Self {
        ChangeLogEntry {
            timestamp: Utc::now(),
            old: old.into(),
            new: new.into(),
            reason,
            level,
            samples,
        }
    }

    /// Tab-separated row as written to the change log.
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.old,
            self.new,
            self.reason,
            self.level,
            self.samples.join(",")
        )
    }
}

impl Display for ChangeLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({} at level {}, {} samples)",
            self.old,
            self.new,
            self.reason,
            self.level,
            self.samples.len()
        )
    }
}

///
/// Append a run's entries to the day's change log file, creating the
/// directory and the header row as needed.
///
/// # Arguments
/// - dir: the store's `change_log/` directory
/// - entries: changes in the order they happened
/// - profiles: number of profiles processed by the run, for the footer
///
/// # Returns
/// The number of rows written, footer excluded.
///
pub fn append_change_log(dir: &Path, entries: &[ChangeLogEntry], profiles: usize) -> io::Result<usize> {
    fs::create_dir_all(dir)?;

    let now = Utc::now();
    let path = dir.join(format!("{}.tsv", now.format("%Y-%m-%d")));
    let is_new = !path.exists();

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut writer = BufWriter::new(file);

    if is_new {
        writeln!(writer, "{}", CHANGE_LOG_HEADER)?;
    }
    for entry in entries {
        writeln!(writer, "{}", entry.to_row())?;
    }
    writeln!(
        writer,
        "# run {}: {} profiles processed, {} codes changed",
        now.to_rfc3339_opts(SecondsFormat::Secs, true),
        profiles,
        entries.len()
    )?;
    writer.flush()?;

    Ok(entries.len())
}

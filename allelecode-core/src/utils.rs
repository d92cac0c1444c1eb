use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::{debug, warn};

use crate::consts::NO_CALL_TAGS;
use crate::errors::TableError;
use crate::models::AlleleProfile;
use crate::models::profile::parse_allele_call;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> io::Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open file {:?}: {}", path, e))
    })?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

///
/// Column delimiter for a tabular file: `,` for `.csv` (optionally gzip'd),
/// tab for everything else.
///
pub fn table_delimiter(path: &Path) -> u8 {
    let name = path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);

    if name.ends_with(".csv") { b',' } else { b'\t' }
}

///
/// Read a core locus list: one locus name per line. Blank lines and `#`
/// comments are skipped; with `prefix` set, only names starting with it are
/// kept.
///
pub fn read_locus_list(path: &Path, prefix: Option<&str>) -> io::Result<Vec<String>> {
    let reader = get_dynamic_reader(path)?;

    let mut loci = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        if let Some(prefix) = prefix {
            if !name.starts_with(prefix) {
                continue;
            }
        }
        loci.push(name.to_string());
    }

    Ok(loci)
}

///
/// Allele profiles parsed from a table, aligned to a scheme's loci.
///
#[derive(Debug, Clone)]
pub struct ProfileTable {
    /// Profiles in table order.
    pub profiles: Vec<AlleleProfile>,
    /// Scheme loci that have no column in the table (no-calls everywhere).
    pub missing_loci: Vec<String>,
}

///
/// Parse an allele profile table. The first column holds the sample
/// identifier; the header names the loci of the remaining columns. Only the
/// scheme's `loci` are kept, in scheme order.
///
/// # Arguments
/// - path: CSV or TSV file, optionally gzip'd
/// - loci: core loci of the scheme
///
pub fn read_profile_table(path: &Path, loci: &[String]) -> Result<ProfileTable, TableError> {
    let reader = get_dynamic_reader(path)?;
    let mut table = csv::ReaderBuilder::new()
        .delimiter(table_delimiter(path))
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = table.headers()?.clone();
    if header.len() < 2 {
        return Err(TableError::MissingHeader(path.display().to_string()));
    }

    // table column -> scheme position
    let wanted: HashMap<&str, usize> = loci
        .iter()
        .enumerate()
        .map(|(i, locus)| (locus.as_str(), i))
        .collect();
    let columns: Vec<Option<usize>> = header
        .iter()
        .skip(1)
        .map(|name| wanted.get(name.trim()).copied())
        .collect();

    let present: std::collections::HashSet<usize> = columns.iter().flatten().copied().collect();
    let missing_loci: Vec<String> = loci
        .iter()
        .enumerate()
        .filter(|(i, _)| !present.contains(i))
        .map(|(_, locus)| locus.clone())
        .collect();
    if !missing_loci.is_empty() {
        warn!(
            "{} of {} core loci have no column in {:?}; they count as no-calls",
            missing_loci.len(),
            loci.len(),
            path
        );
    }

    let mut profiles = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut unrecognized = 0usize;

    for (row, record) in table.records().enumerate() {
        let record = record?;
        let sample = record
            .get(0)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(TableError::MissingSample { row: row + 1 })?;

        if !seen.insert(sample.to_string()) {
            return Err(TableError::DuplicateSample(sample.to_string()));
        }

        let mut calls = vec![None; loci.len()];
        for (cell, column) in record.iter().skip(1).zip(columns.iter()) {
            let Some(position) = column else { continue };
            let call = parse_allele_call(cell);
            if call.is_none() && is_unrecognized_cell(cell) {
                unrecognized += 1;
            }
            calls[*position] = call;
        }

        profiles.push(AlleleProfile::new(sample, calls));
    }

    if unrecognized > 0 {
        debug!(
            "{} cells in {:?} were neither allele numbers nor known caller tags; read as no-calls",
            unrecognized, path
        );
    }

    Ok(ProfileTable {
        profiles,
        missing_loci,
    })
}

fn is_unrecognized_cell(cell: &str) -> bool {
    let cell = cell.trim();
    if cell.is_empty() || cell == "-" || cell.parse::<i64>().is_ok() {
        return false;
    }
    !NO_CALL_TAGS.iter().any(|tag| cell.eq_ignore_ascii_case(tag))
}

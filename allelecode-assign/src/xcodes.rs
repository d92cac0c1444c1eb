//! Xcodes: code prefixes whose groups are known to be over-dispersed.
//!
//! A code below an Xcode is reported as the Xcode with a trailing `x`
//! (`1.2x`) instead of its full code. This only affects how results are
//! rendered; stored codes never change.

use std::io::BufRead;
use std::path::Path;

use log::debug;

use allelecode_core::errors::TableError;
use allelecode_core::models::NomenclatureCode;
use allelecode_core::models::code::{format_prefix, parse_prefix};
use allelecode_core::utils::get_dynamic_reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XcodeList {
    codes: Vec<Vec<u32>>,
}

impl XcodeList {
    pub fn new(codes: Vec<Vec<u32>>) -> Self {
        XcodeList { codes }
    }

    ///
    /// Read an Xcode table: tab-separated, the first column holds a code or
    /// code prefix. A header line is tolerated; blank lines and `#` comments
    /// are skipped.
    ///
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let reader = get_dynamic_reader(path)?;

        let mut codes = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let field = line.split('\t').next().unwrap_or_default().trim();
            if field.is_empty() || field.starts_with('#') {
                continue;
            }

            match parse_prefix(field) {
                Ok(code) => codes.push(code),
                Err(_) if i == 0 => continue,
                Err(_) => {
                    return Err(TableError::MalformedCode {
                        row: i + 1,
                        value: field.to_string(),
                    });
                }
            }
        }

        debug!("Read {} Xcodes from {:?}", codes.len(), path);
        Ok(XcodeList { codes })
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// First Xcode, in list order, that `code` falls under.
    pub fn matching(&self, code: &NomenclatureCode) -> Option<&[u32]> {
        self.codes
            .iter()
            .find(|xcode| xcode.len() <= code.depth() && code.starts_with(xcode))
            .map(Vec::as_slice)
    }

    pub fn render(&self, code: &NomenclatureCode) -> String {
        match self.matching(code) {
            Some(xcode) => format!("{}x", format_prefix(xcode)),
            None => code.to_string(),
        }
    }
}

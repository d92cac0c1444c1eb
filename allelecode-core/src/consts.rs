/// Minimum fraction of called core loci before a profile is flagged.
pub const DEFAULT_MIN_PRESENCE: f64 = 0.95;

/// Placeholder cells written by allele callers for loci without a call.
pub const NO_CALL_TAGS: &[&str] = &["LNF", "NIPH", "NIPHEM", "PLOT3", "PLOT5", "LOTSC", "ALM", "ASM"];

/// Built-in organism schemes: prefix and locus-count thresholds, coarsest level first.
pub const PRESETS: &[(&str, &[u32])] = &[
    ("CAMP", &[84, 61, 24, 14, 5, 1]),
    ("LMO", &[71, 51, 36, 19, 7, 1]),
    ("SALM", &[80, 28, 15, 7, 4, 1]),
    ("EC", &[77, 51, 16, 6, 1]),
];

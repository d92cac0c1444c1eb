use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Scheme defines no threshold levels")]
    EmptyHierarchy,

    #[error("Level {0} is defined more than once")]
    DuplicateLevel(usize),

    #[error("Level {missing} is missing; levels must be contiguous from 0 (found {found} levels)")]
    MissingLevel { missing: usize, found: usize },

    #[error(
        "Threshold {threshold} at level {level} exceeds threshold {previous} of the level above; thresholds must not increase with depth"
    )]
    IncreasingThreshold {
        level: usize,
        threshold: u32,
        previous: u32,
    },

    #[error("Scheme has an empty core locus list")]
    EmptyLocusList,

    #[error("Locus listed more than once: {0}")]
    DuplicateLocus(String),

    #[error("min_presence must lie within [0, 1], got {0}")]
    InvalidMinPresence(f64),

    #[error("Unknown scheme preset: {0}")]
    UnknownPreset(String),

    #[error("Scheme file must end in `toml`, `yaml` or `yml`: {0}")]
    InvalidFileType(String),

    #[error("Scheme `{0}` has no loci; provide a locus list")]
    MissingLoci(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistanceError {
    #[error("No locus is called in both profiles")]
    InsufficientOverlap,

    #[error("Profiles cover a different number of loci ({0} vs {1})")]
    LengthMismatch(usize, usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataIntegrityError {
    #[error("Branch {branch} appears twice under ancestor `{parent}`")]
    DuplicateSibling { parent: String, branch: u32 },

    #[error("Sample `{0}` is stored more than once")]
    DuplicateSample(String),

    #[error("Code `{code}` of sample `{sample}` has {found} levels, expected {expected}")]
    CodeDepth {
        sample: String,
        code: String,
        found: usize,
        expected: usize,
    },

    #[error("Code `{code}` of sample `{sample}` contains a zero branch")]
    ZeroBranch { sample: String, code: String },

    #[error("Sample `{sample}` sits on unregistered branch `{prefix}`")]
    UnregisteredBranch { sample: String, prefix: String },

    #[error("Registered branch `{0}` has no members")]
    EmptyBranch(String),

    #[error("Cannot rename `{old}` into `{new}`: target already holds sub-branches")]
    RenameCollision { old: String, new: String },

    #[error("Cannot rename `{old}` into `{new}`: prefixes differ in length")]
    RenameDepth { old: String, new: String },

    #[error("Query for level {level} used a prefix of {found} levels")]
    PrefixLength { level: usize, found: usize },

    #[error("Unknown founder record: {0}")]
    UnknownRecord(usize),

    #[error("Profile of sample `{sample}` has {found} loci, store expects {expected}")]
    ProfileWidth {
        sample: String,
        found: usize,
        expected: usize,
    },
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Allele table has no header row: {0}")]
    MissingHeader(String),

    #[error("Allele table row {row} has no sample identifier")]
    MissingSample { row: usize },

    #[error("Sample `{0}` appears more than once in the allele table")]
    DuplicateSample(String),

    #[error("Line {row} does not start with a nomenclature code: `{value}`")]
    MalformedCode { row: usize, value: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

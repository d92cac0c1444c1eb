use clap::{Arg, Command, arg};

pub const ASSIGN_CMD: &str = "assign";
pub const DEFAULT_OUTPUT: &str = "allele_codes.tsv";

pub fn create_assign_cli() -> Command {
    Command::new(ASSIGN_CMD)
        .about("Assign hierarchical allele codes to new cgMLST profiles and update the founder store.")
        .arg(
            arg!(--alleles <ALLELES>)
                .required(true)
                .help("Allele profile table (CSV/TSV, optionally gzip'd); first column is the sample id"),
        )
        .arg(
            arg!(--scheme <SCHEME>)
                .required(true)
                .help("Scheme file (.toml/.yaml) or preset name: CAMP, LMO, SALM, EC"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .required(true)
                .help("Directory holding the <PREFIX>_nomenclature store"),
        )
        .arg(
            arg!(--loci <LOCI>)
                .required(false)
                .help("Core locus list, one per line (required for presets)"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .help("Result table; .csv is comma-separated, anything else tab-separated (default: allele_codes.tsv)"),
        )
        .arg(
            arg!(--xcodes <XCODES>)
                .required(false)
                .help("Xcode list (TSV, first column a code prefix) used when rendering results"),
        )
        .arg(arg!(--nosave "Assign codes without writing the store or the change log"))
}

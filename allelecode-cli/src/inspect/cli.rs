use clap::{Arg, Command, arg};

pub const INSPECT_CMD: &str = "inspect";

pub fn create_inspect_cli() -> Command {
    Command::new(INSPECT_CMD)
        .about("Summarize a founder store, or show the code and aliases of one founder.")
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
            arg!(--sample <SAMPLE>)
                .required(false)
                .help("Founder to look up"),
        )
}

mod assign;
mod inspect;

use anyhow::Result;
use clap::{ArgAction, Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "allelecode";
    pub const BIN_NAME: &str = "allelecode";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Stable hierarchical allele codes for cgMLST profiles.")
        .subcommand_required(true)
        .arg(
            arg!(-v --verbose "Log every level decision and rename")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(assign::cli::create_assign_cli())
        .subcommand(inspect::cli::create_inspect_cli())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // ASSIGN
        //
        Some((assign::cli::ASSIGN_CMD, matches)) => {
            init_logging(matches.get_flag("verbose"));
            assign::handlers::run_assign(matches)?;
        }

        //
        // INSPECT
        //
        Some((inspect::cli::INSPECT_CMD, matches)) => {
            init_logging(matches.get_flag("verbose"));
            inspect::handlers::run_inspect(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_assign_requires_inputs() {
        let result = build_parser().try_get_matches_from(["allelecode", "assign", "--scheme", "SALM"]);
        assert!(result.is_err());
    }

    #[rstest]
    fn test_assign_flags() {
        let matches = build_parser()
            .try_get_matches_from([
                "allelecode",
                "assign",
                "--alleles",
                "profiles.tsv",
                "--scheme",
                "SALM",
                "--data-dir",
                "store",
                "--nosave",
                "--verbose",
            ])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, assign::cli::ASSIGN_CMD);
        assert!(sub.get_flag("nosave"));
        assert!(sub.get_flag("verbose"));
        assert_eq!(sub.get_one::<String>("data-dir").unwrap(), "store");
    }
}

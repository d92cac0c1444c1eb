use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use allelecode_assign::results::{result_rows, write_results};
use allelecode_assign::{AssignmentEngine, RunOutcome, XcodeList};
use allelecode_core::load_hierarchy;
use allelecode_core::utils::read_profile_table;
use allelecode_store::{StoreLayout, StoreLock, load_store, save_store};

use super::cli::DEFAULT_OUTPUT;

pub fn run_assign(matches: &ArgMatches) -> Result<()> {
    let alleles = matches
        .get_one::<String>("alleles")
        .expect("--alleles is required");
    let scheme = matches
        .get_one::<String>("scheme")
        .expect("--scheme is required");
    let data_dir = matches
        .get_one::<String>("data-dir")
        .expect("--data-dir is required");
    let loci = matches.get_one::<String>("loci").map(Path::new);
    let output = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or(DEFAULT_OUTPUT);
    let nosave = matches.get_flag("nosave");

    let hierarchy = load_hierarchy(scheme, loci)
        .with_context(|| format!("Failed to load scheme `{}`", scheme))?;
    info!(
        "Scheme {}: thresholds {:?}, {} core loci",
        hierarchy.prefix(),
        hierarchy.thresholds(),
        hierarchy.loci().len()
    );

    let xcodes = match matches.get_one::<String>("xcodes") {
        Some(path) => XcodeList::from_path(Path::new(path))
            .with_context(|| format!("Failed to read Xcodes from {}", path))?,
        None => XcodeList::default(),
    };

    let table = read_profile_table(Path::new(alleles), hierarchy.loci())
        .with_context(|| format!("Failed to read allele profiles from {}", alleles))?;
    info!("Read {} profiles from {}", table.profiles.len(), alleles);

    let layout = StoreLayout::new(Path::new(data_dir), hierarchy.prefix());
    let _lock = StoreLock::acquire(&layout)
        .with_context(|| format!("Failed to lock store {}", layout.root().display()))?;
    let store = load_store(&layout, &hierarchy)
        .with_context(|| format!("Failed to load store {}", layout.root().display()))?;

    let pb = ProgressBar::new(table.profiles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} profiles ({eta})")?
            .progress_chars("##-"),
    );

    let outcome = AssignmentEngine::new(&hierarchy)
        .run_with(store, &table.profiles, |_| pb.inc(1))
        .context("Founder store corrupted during the run; nothing was saved")?;
    pb.finish_and_clear();

    let RunOutcome {
        store,
        assignments,
        changes,
        stats,
    } = outcome;

    store
        .validate()
        .context("Founder store failed validation after the run; nothing was saved")?;

    if nosave {
        info!("--nosave given; store and change log left untouched");
    } else {
        save_store(&layout, &store, &hierarchy, &changes, table.profiles.len())
            .with_context(|| format!("Failed to save store {}", layout.root().display()))?;
    }

    let rows = result_rows(&assignments, &store, &changes, &xcodes);
    write_results(Path::new(output), &rows)
        .with_context(|| format!("Failed to write results to {}", output))?;

    info!("{}", stats);
    info!("Wrote {} result rows to {}", rows.len(), output);

    Ok(())
}

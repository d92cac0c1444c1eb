use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ArgMatches;

use allelecode_core::load_hierarchy;
use allelecode_store::{StoreLayout, load_store};

pub fn run_inspect(matches: &ArgMatches) -> Result<()> {
    let scheme = matches
        .get_one::<String>("scheme")
        .expect("--scheme is required");
    let data_dir = matches
        .get_one::<String>("data-dir")
        .expect("--data-dir is required");
    let loci = matches.get_one::<String>("loci").map(Path::new);

    let hierarchy = load_hierarchy(scheme, loci)
        .with_context(|| format!("Failed to load scheme `{}`", scheme))?;
    let layout = StoreLayout::new(Path::new(data_dir), hierarchy.prefix());
    let store = load_store(&layout, &hierarchy)
        .with_context(|| format!("Failed to load store {}", layout.root().display()))?;

    match matches.get_one::<String>("sample") {
        Some(sample) => {
            let Some(record) = store.find_sample(sample).and_then(|id| store.get(id)) else {
                bail!("`{}` is not a founder of {}", sample, hierarchy.prefix());
            };
            let aliases: Vec<String> = record.aliases.iter().map(|a| a.to_string()).collect();

            println!("{}", record);
            println!(
                "aliases: {}",
                if aliases.is_empty() { "-".to_string() } else { aliases.join(", ") }
            );
            println!(
                "called loci: {}/{}",
                record.profile.called_loci(),
                record.profile.len()
            );
        }
        None => print!("{}", store),
    }

    Ok(())
}

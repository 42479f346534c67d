//! Show edge store statistics.

use affinity::prelude::*;
use anyhow::{bail, Result};
use colored::Colorize;

use crate::config::Config;

pub fn run() -> Result<()> {
    let config = Config::load()?;

    if !config.store.database.exists() {
        bail!("No edge store found. Run {} first.", "affinity generate".cyan());
    }

    let store = config.open_store()?;
    let records = config.load_records()?;
    let sets = store.set_stats()?;

    println!("{}", "Affinity Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Edge Store".blue().bold());
    println!("  Database:          {}", config.store.database.display());
    println!("  Total edges:       {}", store.edge_count()?.to_string().cyan());
    println!("  Stored sets:       {}", sets.len().to_string().cyan());
    println!();

    println!("{}", "Sets".blue().bold());
    if sets.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for set in &sets {
        let configured = config
            .recommendations
            .recommendation(&set.source_type, &set.recommendation_name)
            .is_some();
        let marker = if configured { "✓".green() } else { "•".yellow() };
        let avg = if set.sources > 0 {
            set.edges as f64 / set.sources as f64
        } else {
            0.0
        };
        println!(
            "  {} {}.{}  {} sources, {} edges ({avg:.1} per source)",
            marker,
            set.source_type,
            set.recommendation_name.white().bold(),
            set.sources.to_string().cyan(),
            set.edges.to_string().cyan()
        );
        if configured {
            let total = records.record_count(&set.source_type)?;
            if total > 0 {
                println!(
                    "      coverage: {:.1}% of {} records",
                    100.0 * set.sources as f64 / total as f64,
                    total
                );
            }
        }
    }

    Ok(())
}

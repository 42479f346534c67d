//! List configured recommendation sets.

use affinity::prelude::*;
use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

pub fn run() -> Result<()> {
    let config = Config::load()?;
    let registry = &config.recommendations;
    let sets = registry.set_names();

    if sets.is_empty() {
        println!("{} No recommendation sets configured.", "•".yellow());
        return Ok(());
    }

    println!("{}", "Recommendation Sets".white().bold());
    println!("{}", "═".repeat(40).dimmed());

    for (kind, name) in sets {
        let Some(set) = registry.recommendation(&kind, &name) else {
            continue;
        };
        let algorithm = String::from(set.recommendation_algorithm.clone());
        let algorithm = match set.recommendation_algorithm {
            Algorithm::Unknown(_) => algorithm.red(),
            _ => algorithm.cyan(),
        };
        println!(
            "  {}.{}  {}  count={} order={} target={}",
            kind.white().bold(),
            name.white().bold(),
            algorithm,
            set.count(registry.default_count()),
            String::from(set.recommendation_order),
            set.target_type(&kind)
        );
    }

    Ok(())
}

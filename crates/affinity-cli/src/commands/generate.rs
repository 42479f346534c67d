//! Generate recommendations for one configured set.

use affinity::prelude::*;
use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

pub fn run(kind: &str, name: &str, dry_run: bool) -> Result<()> {
    let config = Config::load()?;
    let (ctx, _) = config.engine()?;
    let generator = Generator::new(kind, ctx);

    println!("{} Generating {} for {}...", "→".blue(), name.cyan(), kind.cyan());

    if dry_run {
        let set = config
            .recommendations
            .recommendation(kind, name)
            .ok_or_else(|| AffinityError::configuration_missing(kind, name))?;
        let lists = generator.rank(name, &set)?;
        for list in &lists {
            let targets: Vec<String> = list
                .targets
                .iter()
                .map(|t| format!("{} ({:.2})", t.id, t.rank))
                .collect();
            println!("  {} {}", format!("{}:", list.source).white().bold(), targets.join(", "));
        }
        println!();
        println!(
            "{} Ranked {} sources (dry run, nothing written)",
            "✓".green().bold(),
            lists.len().to_string().cyan()
        );
        return Ok(());
    }

    let summary = generator.try_generate(name)?;

    println!(
        "  Algorithm:  {}",
        String::from(summary.algorithm.clone()).cyan()
    );
    println!("  Sources:    {}", summary.sources.to_string().cyan());
    println!("  Edges:      {}", summary.edges.to_string().cyan());
    println!();
    println!("{} Recommendations stored", "✓".green().bold());

    Ok(())
}

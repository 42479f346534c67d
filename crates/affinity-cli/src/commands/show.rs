//! Show stored recommendations for one source record.

use affinity::prelude::*;
use anyhow::{bail, Result};
use colored::Colorize;
use std::collections::HashMap;

use crate::config::Config;

pub fn run(kind: &str, name: &str, source_id: &str, relations: &[String]) -> Result<()> {
    let config = Config::load()?;
    let Some(set) = config.recommendations.recommendation(kind, name) else {
        bail!(
            "No recommendation set {} for {}. Run {} to see configured sets.",
            name.cyan(),
            kind.cyan(),
            "affinity list".cyan()
        );
    };

    let (ctx, store) = config.engine()?;
    let source = RecordId::new(source_id);

    let ranks: HashMap<RecordId, f64> = store
        .edges_for(&EdgeQuery {
            source_type: kind.to_string(),
            source_id: source.clone(),
            recommendation_name: name.to_string(),
            target_type: set.target_type(kind).to_string(),
        })?
        .into_iter()
        .map(|e| (e.target_id, e.rank))
        .collect();

    let targets = Retriever::new(kind, ctx).try_get(&source, name, relations)?;

    println!(
        "{} {} for {}/{}",
        "Recommendations".white().bold(),
        name.cyan(),
        kind,
        source_id.cyan()
    );
    println!("{}", "═".repeat(40).dimmed());

    if targets.is_empty() {
        if ranks.is_empty() {
            println!("  {} No edges stored. Run {} first.", "•".yellow(), "affinity generate".cyan());
        } else {
            println!("  {} {} edges stored but no target records found", "•".yellow(), ranks.len());
        }
        return Ok(());
    }

    for (i, record) in targets.iter().enumerate() {
        let rank = ranks.get(&record.id).copied().unwrap_or_default();
        println!(
            "  {} {} {}",
            format!("{:>2}.", i + 1).blue(),
            record.id.as_str().white().bold(),
            format!("(rank {rank:.2})").dimmed()
        );
        if !record.attributes.0.is_empty() {
            println!("      {}", serde_json::to_string(&record.attributes)?);
        }
        for (relation, value) in &record.relations {
            println!("      {} {}", format!("{relation}:").dimmed(), serde_json::to_string(value)?);
        }
    }

    Ok(())
}

//! Initialize a new Affinity project.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{data_dir, Config, CONFIG_FILE};

pub fn run(path: Option<String>) -> Result<()> {
    let base_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Affinity project...", "→".blue());

    let affinity_dir = data_dir(&base_path);
    std::fs::create_dir_all(&affinity_dir)
        .with_context(|| format!("Failed to create {}", affinity_dir.display()))?;
    println!("  {} Created {}", "✓".green(), affinity_dir.display());

    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    let gitignore_path = affinity_dir.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(&gitignore_path, "*.db\n*.db-wal\n*.db-shm\n")?;
        println!("  {} Created {}", "✓".green(), gitignore_path.display());
    }

    println!();
    println!("{} Affinity project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} add recommendation sets to {}", "1.".blue(), CONFIG_FILE);
    println!("  {} affinity generate <kind> <name>", "2.".blue());
    println!("  {} affinity show <kind> <name> <source-id>", "3.".blue());

    Ok(())
}

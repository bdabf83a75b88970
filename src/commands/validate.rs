//! The `validate` command: parse a run file and report what it holds.

use colored::*;
use std::path::Path;

use crate::io::{JsonStore, TestRunReader};

pub fn run(run_file: &Path) -> anyhow::Result<()> {
    let store = JsonStore::load(run_file)?;
    let stats = store.stats();

    let with_source = store
        .tests()
        .iter()
        .filter(|t| t.source_text.is_some())
        .count();
    let without_coverage = store
        .tests()
        .iter()
        .filter(|t| t.coverage.is_empty())
        .count();

    println!("{} {}", "Run file:".bold(), run_file.display());
    println!("  tests:            {}", stats.test_count);
    println!("  coverage lines:   {}", stats.coverage_line_count);
    println!("  unique files:     {}", stats.unique_files);
    println!("  inline sources:   {with_source}");
    if without_coverage > 0 {
        println!(
            "  {} {without_coverage} tests carry no coverage",
            "note:".yellow()
        );
    }
    println!("{}", "OK".green().bold());
    Ok(())
}

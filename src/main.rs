//! Reductor CLI entry point.
//!
//! Handles tracing initialization, thread-pool sizing and command dispatch.
//! Command implementations live in `commands`.

use anyhow::Result;
use clap::Parser;
use reductor::cli::{configure_thread_pool, get_worker_count, Cli, Commands};
use reductor::commands::{analyze, init, validate};
use reductor::observability::init_tracing;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            run_file,
            format,
            output,
            algorithm,
            threshold,
            max_clusters,
            min_cluster_size,
            timeout,
            jobs,
            keep_shared_coverage,
            no_idf_weighting,
            dbscan_eps,
            dbscan_min_samples,
            hierarchical_clusters,
            linkage,
        } => {
            configure_thread_pool(get_worker_count(jobs));
            analyze::run(analyze::AnalyzeOptions {
                run_file,
                config_path: cli.config,
                format,
                output,
                algorithm,
                threshold,
                max_clusters,
                min_cluster_size,
                timeout,
                keep_shared_coverage,
                no_idf_weighting,
                dbscan_eps,
                dbscan_min_samples,
                hierarchical_clusters,
                linkage,
            })
        }
        Commands::Init { force } => init::run(force),
        Commands::Validate { run_file } => validate::run(&run_file),
    }
}

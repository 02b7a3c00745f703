//! Run an accessibility suite from a TOML config file
//!
//! Usage: cargo run -p a11y-harness --example run_suite -- <config.toml> [options]
//!
//! See `--help` for the options.

use a11y_harness::cli::RunArgs;
use a11y_harness::config::SuiteConfig;
use a11y_harness::reporter::{ArtifactWriter, Reporter};
use a11y_harness::runner::SuiteRunner;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = RunArgs::parse();

    println!("Loading config from: {}", args.config.display());
    let config = SuiteConfig::from_file(&args.config)?;

    println!("Starting suite: {}", config.suite.name);
    println!("  Sites file: {}", config.suite.sites_file.display());
    println!("  Parallel contexts: {}", config.suite.parallel_contexts);
    println!("  Capture mode: {:?}", config.capture.mode);
    println!();

    let runner = SuiteRunner::new(config.suite.headless).await?;
    let results = runner
        .run_with_overrides(&config, &args.overrides())
        .await?;

    let reporter = Reporter::new(args.format);
    match &args.report {
        Some(path) => reporter.write_to_file(&results, path)?,
        None => reporter.report(&results)?,
    }

    let writer = ArtifactWriter::new(config.output_dir());
    let dirs = writer.write_suite(&results)?;
    println!("Artifacts for {} pages in {}", dirs.len(), writer.root().display());

    runner.close().await?;

    if !results.passed {
        std::process::exit(1);
    }
    Ok(())
}

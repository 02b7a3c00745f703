use a11y_harness::config::SuiteConfig;
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("crates/a11y-harness/suites/a11y.toml")
    };

    println!("Validating config file: {}", config_path.display());

    let config = SuiteConfig::from_file(&config_path)?;

    println!("\n✓ Successfully parsed configuration!");
    println!("\nSuite: {}", config.suite.name);
    println!("Output dir: {}", config.output_dir().display());
    println!("Parallel contexts: {}", config.suite.parallel_contexts);
    println!("Headless: {}", config.suite.headless);

    println!("\nTimeouts:");
    println!("  Navigation: {:?}", config.timeouts.navigation());
    println!("  Quiescence: {:?}", config.timeouts.quiescence());

    println!("\nAudit:");
    match config.axe_script() {
        Some(path) if path.exists() => println!("  axe-core: {}", path.display()),
        Some(path) => println!("  axe-core: {} (missing, pages will use the title check)", path.display()),
        None => println!("  axe-core: not configured (pages will use the title check)"),
    }

    println!("\nThresholds:");
    println!("  Max violations: {}", config.thresholds.max_violations);
    println!(
        "  Max missing alt: {:.1}%",
        config.thresholds.heuristics.max_missing_alt_percentage
    );
    println!("  Require landmarks: {}", config.thresholds.heuristics.require_landmarks);
    println!(
        "  Require keyboard navigation: {}",
        config.thresholds.heuristics.require_keyboard_navigation
    );

    let sites = config.load_sites()?;
    let baseline = config.load_baseline_rules()?;
    let request = sites.rule_filter(&baseline).to_request();

    println!("\nRules:");
    println!("  Tags: {}", request.tags.join(", "));
    println!("  Rules: {} ({} baseline)", request.rules.len(), baseline.0.len());
    println!("  Disabled: {}", request.disabled_rules.join(", "));

    println!("\nUrls ({}):", sites.urls.len());
    for (i, url) in sites.urls.iter().enumerate() {
        println!("  {}. {}", i + 1, url);
    }

    println!("\n✓ All validations passed!");

    Ok(())
}

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use k6adapt_core::{adapt, AdapterConfig, MultiMatchPolicy};

/// k6adapt - rewrite bundled load-test modules for k6 compatibility
///
/// k6 expects the `options` export of a script to be a plain object, while a
/// compiled module exports its zero-argument options provider under that
/// name. k6adapt patches the bundler's emitted entry file after the build so
/// the provider is invoked once and its result is exported instead.
#[derive(Parser, Debug, Clone)]
#[command(name = "k6adapt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Build artifact to rewrite (defaults to the configured entry)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to k6adapt.json configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Policy when more than one export clause matches (first, error)
    #[arg(long, value_name = "POLICY")]
    multi_match: Option<String>,

    /// Print the rewritten artifact instead of writing it back
    #[arg(long)]
    dry_run: bool,

    /// Initialize a k6adapt.json configuration file
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for detailed logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    if cli.init {
        AdapterConfig::init_file(Path::new(AdapterConfig::DEFAULT_FILE))?;
        println!("Created {}", AdapterConfig::DEFAULT_FILE);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let path = cli
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.entry));

    debug!("artifact: {}", path.display());
    debug!("multi-match policy: {:?}", config.multi_match);

    run(&path, &config, cli.dry_run)
}

/// Load configuration from file (if present) and apply CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<AdapterConfig> {
    let mut config = if let Some(ref project_path) = cli.project {
        AdapterConfig::from_file(project_path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        let default_path = Path::new(AdapterConfig::DEFAULT_FILE);
        if default_path.exists() {
            AdapterConfig::from_file(default_path).map_err(|e| {
                anyhow::anyhow!("Failed to load {}: {}", AdapterConfig::DEFAULT_FILE, e)
            })?
        } else {
            AdapterConfig::default()
        }
    };

    if let Some(ref policy) = cli.multi_match {
        config.multi_match = parse_policy(policy)?;
    }

    Ok(config)
}

/// Parse the multi-match policy string
fn parse_policy(policy: &str) -> anyhow::Result<MultiMatchPolicy> {
    match policy {
        "first" => Ok(MultiMatchPolicy::First),
        "error" => Ok(MultiMatchPolicy::Error),
        _ => Err(anyhow::anyhow!(
            "Invalid multi-match policy '{}'. Supported policies: first, error",
            policy
        )),
    }
}

/// Read the artifact, rewrite the options export, and write the result back.
///
/// A missing or unwritable artifact is fatal; an artifact with no matching
/// export clause is not (the build pipeline continues, the script just keeps
/// whatever exports it had).
fn run(path: &Path, config: &AdapterConfig, dry_run: bool) -> anyhow::Result<()> {
    let document = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

    let result = adapt(&document, config)
        .map_err(|e| anyhow::anyhow!("Failed to adapt {}: {}", path.display(), e))?;

    if result.extra_matches > 0 {
        warn!(
            "{} additional matching export clause(s) in {} left untouched",
            result.extra_matches,
            path.display()
        );
    }

    if !result.changed {
        eprintln!("⚠ Could not find options export, skipping conversion");
        return Ok(());
    }

    if dry_run {
        print!("{}", result.output);
        return Ok(());
    }

    std::fs::write(path, result.output)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;

    println!("✓ Converted options to object for k6 compatibility");
    Ok(())
}

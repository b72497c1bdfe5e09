use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, Level};

use sigverify::{AuditLog, AuditRecord, SearchRegion, SignatureError, Strategy, Verifier, VerifierConfig};

#[derive(Parser)]
#[command(name = "sigverify")]
#[command(about = "Compare a handwritten signature against a reference")]
struct Cli {
    /// Reference signature image
    #[arg(value_name = "REFERENCE")]
    reference: PathBuf,

    /// Sample signature image to verify
    #[arg(value_name = "SAMPLE")]
    sample: PathBuf,

    /// Similarity strategy (overrides the config file)
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Twin-branch `.rten` model for the embedding strategy
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Top of the search band as a fraction of image height
    #[arg(long, value_name = "F")]
    search_top: Option<f32>,

    /// Bottom of the search band as a fraction of image height
    #[arg(long, value_name = "F")]
    search_bottom: Option<f32>,

    /// Fail instead of falling back to the whole search region
    #[arg(long)]
    no_fallback: bool,

    /// Save per-step extraction images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Append a JSON line per comparison to this file
    #[arg(long, value_name = "FILE")]
    audit_log: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            let client_error = err
                .downcast_ref::<SignatureError>()
                .is_some_and(SignatureError::is_client_error);
            ExitCode::from(if client_error { 2 } else { 1 })
        }
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let config = load_config(args)?;

    let reference = std::fs::read(&args.reference)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.reference.display(), e))?;
    let sample = std::fs::read(&args.sample)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", args.sample.display(), e))?;

    let mut verifier = Verifier::new(config)?;
    if let Some(debug_dir) = &args.debug_out {
        verifier = verifier.with_debug_dir(debug_dir.clone())?;
    }

    let comparison = verifier.verify_bytes(&reference, &sample)?;
    println!("{}", serde_json::to_string_pretty(&comparison)?);

    if let Some(path) = &args.audit_log {
        let record = AuditRecord::from_comparison(
            &comparison,
            &display_name(&args.reference),
            &display_name(&args.sample),
        )?;
        AuditLog::new(path).append(&record)?;
    }

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied, then validated
fn load_config(args: &Cli) -> anyhow::Result<VerifierConfig> {
    let mut config = match &args.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default(),
    };

    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(model) = &args.model {
        config.embedding.model_path = Some(model.clone());
    }
    if args.search_top.is_some() || args.search_bottom.is_some() {
        let current = config.extraction.search_region.unwrap_or(SearchRegion {
            top: 0.0,
            bottom: 1.0,
        });
        config.extraction.search_region = Some(SearchRegion {
            top: args.search_top.unwrap_or(current.top),
            bottom: args.search_bottom.unwrap_or(current.bottom),
        });
    }
    if args.no_fallback {
        config.extraction.fallback_to_search_region = false;
    }

    config.validate()?;
    Ok(config)
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

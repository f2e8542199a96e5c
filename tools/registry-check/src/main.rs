use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use rollup_registry_validator::{
    RecordLocation, RegistryConfig, RegistryValidator, ValidationReport, ValidationRequest,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the record, e.g. data/sepolia/0xabc...def.json
    file: PathBuf,

    /// Review title naming the operation, e.g. "[Update] sepolia 0xabc...def - My L2"
    #[arg(short = 't', long)]
    pr_title: Option<String>,

    /// RPC endpoint overriding {NETWORK}_RPC_URL and the public default
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Print the verdict as JSON
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct Verdict<'a> {
    file: String,
    valid: bool,
    errors: &'a [String],
    warnings: &'a [String],
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let path = cli.file.to_string_lossy().to_string();
    let location = RecordLocation::from_path(path.as_str());
    let network = location
        .network()
        .with_context(|| format!("Could not extract a supported network from file path: {}", path))?;

    let mut config = RegistryConfig::from_env(network);
    if let Some(url) = cli.rpc_url {
        config = config.with_rpc_url(url);
    }
    debug!(%network, rpc = %config.rpc_url, "resolved configuration");

    let text = std::fs::read_to_string(&cli.file).with_context(|| format!("Failed to read {}", path))?;
    let document = serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path))?;

    let validator = RegistryValidator::from_config(&config)?;
    let mut request = ValidationRequest::new(document, path.clone());
    if let Some(title) = cli.pr_title {
        request = request.with_operation_tag(title);
    }

    info!(file = %path, "validating record");
    let report = validator.validate(&request).await;

    if cli.json {
        let verdict = Verdict {
            file: path,
            valid: report.is_valid(),
            errors: report.errors(),
            warnings: report.warnings(),
        };
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_report(&path, &report);
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(path: &str, report: &ValidationReport) {
    if report.is_valid() {
        println!("✅ {} is valid", path);
    } else {
        println!("❌ {} failed validation:", path);
        for (i, error) in report.errors().iter().enumerate() {
            println!("  {}. {}", i + 1, error);
        }
    }

    if !report.warnings().is_empty() {
        println!("Warnings:");
        for (i, warning) in report.warnings().iter().enumerate() {
            println!("  {}. {}", i + 1, warning);
        }
    }
}

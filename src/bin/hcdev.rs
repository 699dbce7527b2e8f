//! hcdev CLI binary.
//!
//! Offline tooling for the appliance control protocol.
//!
//! # Commands
//!
//! - `validate` - Check a write payload against a feature catalog
//! - `normalize` - Resolve value records to display names and labels
//! - `replay` - Push captured frames through the protocol core

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hcdev::{
    catalog::FeatureCatalog,
    config::Config,
    protocol::{normalize, validate_request, Action},
    HcDevice, MemoryTransport, Transport, VERSION,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "hcdev")]
#[command(version = VERSION)]
#[command(about = "Home appliance device-control protocol tools", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/hcdev/config.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Feature catalog JSON (overrides the config file)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a write payload (POST records) against the catalog
    Validate {
        /// JSON records (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Target resource (/ro/values or /ro/activeProgram)
        #[arg(short, long, default_value = "/ro/values")]
        resource: String,
    },

    /// Normalize {uid, value} records
    Normalize {
        /// JSON records (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output as pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Replay newline-delimited captured frames through the dispatcher
    Replay {
        /// Frames (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = load_config(cli.config)?;
    let catalog_path = cli.catalog.or_else(|| config.catalog.path.clone());
    let catalog = catalog_path.map(FeatureCatalog::load).transpose()?;

    match cli.command {
        Commands::Validate {
            input,
            file,
            resource,
        } => cmd_validate(input, file, &resource, catalog.as_ref()),

        Commands::Normalize {
            input,
            file,
            pretty,
        } => cmd_normalize(input, file, pretty, catalog.as_ref()),

        Commands::Replay {
            input,
            file,
            output,
        } => cmd_replay(input, file, output, &config, catalog),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let file = match path.or_else(|| Config::default_path().filter(|p| p.exists())) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            Config::from_file(path)?
        },
        None => Config::default(),
    };
    Ok(file.merge(Config::from_env()))
}

fn cmd_validate(
    input: Option<String>,
    file: Option<PathBuf>,
    resource: &str,
    catalog: Option<&FeatureCatalog>,
) -> anyhow::Result<()> {
    let records = read_records(input, file)?;
    validate_request(catalog, Action::Post, resource, &records)?;
    println!("OK: {} record(s) valid for POST {resource}", records.len());
    Ok(())
}

fn cmd_normalize(
    input: Option<String>,
    file: Option<PathBuf>,
    pretty: bool,
    catalog: Option<&FeatureCatalog>,
) -> anyhow::Result<()> {
    let records = read_records(input, file)?;
    let values = Value::Object(normalize(catalog, &records)?);

    let output = if pretty {
        serde_json::to_string_pretty(&values)?
    } else {
        serde_json::to_string(&values)?
    };
    println!("{output}");
    Ok(())
}

fn cmd_replay(
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    config: &Config,
    catalog: Option<FeatureCatalog>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;

    let mut transport = MemoryTransport::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        transport.push_frame(line.to_string());
    }
    let frames = transport.pending();
    transport.connect()?;

    let mut device = HcDevice::new("replay", transport, catalog).with_client(&config.client);

    let mut lines = Vec::new();
    while device.transport().pending() > 0 {
        if let Some(values) = device.recv() {
            if !values.is_empty() {
                lines.push(serde_json::to_string(&Value::Object(values))?);
            }
        }
    }

    tracing::info!(
        frames,
        reported = lines.len(),
        replies = device.transport().sent().len(),
        state = ?device.state(),
        "Replay finished"
    );

    write_output(output, &lines.join("\n"))
}

/// Parse a record or list of records
fn read_records(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<Vec<Value>> {
    let content = read_input(input, file)?;
    Ok(match serde_json::from_str(&content)? {
        Value::Array(records) => records,
        record => vec![record],
    })
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else if !content.is_empty() {
        println!("{content}");
    }
    Ok(())
}

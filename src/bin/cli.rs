//! slotkv CLI
//!
//! Command-line interface for inspecting and editing a slotkv data file.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use slotkv::{Config, KvStore, SlotError};
use tracing_subscriber::{fmt, EnvFilter};

/// slotkv CLI
#[derive(Parser, Debug)]
#[command(name = "slotkv-cli")]
#[command(about = "CLI for slotkv data files")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./slotkv_data/store.db")]
    file: String,

    /// Maximum data file size in MB
    #[arg(short = 'm', long, default_value = "1024")]
    max_file_mb: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Store a new key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Check whether a key exists
    Exists {
        /// The key to check
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Cross-check the index against the on-disk chain
    Verify,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,slotkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.file)
        .max_file_size(args.max_file_mb * 1024 * 1024)
        .sync_on_write(true)
        .build();

    let store = match KvStore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.file, e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&store, args.command);

    if let Err(e) = store.close() {
        tracing::error!("Failed to close {}: {}", args.file, e);
        return ExitCode::FAILURE;
    }

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(store: &KvStore, command: Commands) -> Result<ExitCode, SlotError> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Commands::Get { key } => match store.get(&key) {
            Ok(value) => {
                stdout.write_all(&value)?;
                writeln!(stdout)?;
            }
            Err(SlotError::KeyNotFound) => {
                eprintln!("(nil)");
                return Ok(ExitCode::from(1));
            }
            Err(e) => return Err(e),
        },
        Commands::Put { key, value } => {
            store.create(&key, value.as_bytes(), None)?;
            writeln!(stdout, "OK")?;
        }
        Commands::Exists { key } => {
            let exists = store.exists(&key);
            writeln!(stdout, "{}", exists)?;
            if !exists {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Del { key } => {
            store.delete(&key)?;
            writeln!(stdout, "OK")?;
        }
        Commands::Keys => {
            for key in store.keys() {
                writeln!(stdout, "{}", key)?;
            }
        }
        Commands::Verify => {
            let report = store.verify()?;
            writeln!(
                stdout,
                "indexed={} reachable={} unreachable={} mismatched={}",
                report.indexed,
                report.reachable,
                report.unreachable.len(),
                report.mismatched.len()
            )?;
            for key in &report.mismatched {
                writeln!(stdout, "mismatched: {}", key)?;
            }
            if !report.is_consistent() {
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

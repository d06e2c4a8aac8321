//! pagekv CLI
//!
//! Command-line interface for a pagekv data file.
//!
//! Each invocation attaches to the existing file, runs one command and closes
//! the store, which flushes any buffered writes as a page. Only `set` creates
//! a missing file.

use clap::{Parser, Subcommand};
use pagekv::{Config, PageKvError, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// pagekv CLI
#[derive(Parser, Debug)]
#[command(name = "pagekv")]
#[command(about = "Embedded log-structured key-value store")]
#[command(version)]
struct Args {
    /// Page log file
    #[arg(short, long, default_value = "./pagekv.dat")]
    data: String,

    /// Keys buffered in memory before a page is written
    #[arg(short, long, default_value = "1024")]
    flush_threshold: usize,

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

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Count the stored copies of a key (stale ones included)
    Count {
        /// The key to count
        key: String,
    },

    /// Rewrite the file keeping only the newest value per key
    Compact,

    /// Print page and per-key copy counts
    Stats,

    /// Delete the data file
    Clear,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,pagekv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> pagekv::Result<()> {
    let config = Config::builder()
        .data_path(&args.data)
        .flush_threshold(args.flush_threshold)
        .build();

    // Only writes may create the data file
    let mut store = match args.command {
        Commands::Set { .. } => Store::reopen(config)?,
        Commands::Clear => Store::new(config)?,
        _ => Store::reopen_existing(config)?,
    };

    match args.command {
        Commands::Get { key } => match store.get::<String>(&key) {
            Ok(value) => println!("{}", value),
            Err(PageKvError::KeyNotFound(_)) => {
                println!("(not found)");
            }
            Err(e) => return Err(e),
        },
        Commands::Set { key, value } => {
            store.set(&key, &value)?;
            println!("OK");
        }
        Commands::Count { key } => {
            println!("{}", store.count_instances(&key)?);
        }
        Commands::Compact => {
            let summary = store.compact()?;
            println!(
                "kept {} of {} entries from {} pages ({} -> {} bytes)",
                summary.entries_kept,
                summary.entries_read,
                summary.pages_read,
                summary.bytes_before,
                summary.bytes_after
            );
        }
        Commands::Stats => {
            let stats = store.stats()?;
            println!("pages:        {}", stats.page_count);
            println!("entries:      {}", stats.page_entries);
            println!("distinct:     {}", stats.distinct_keys());
            println!("stale:        {}", stats.stale_entries());
            println!("file bytes:   {}", stats.file_len);
            for (key, copies) in &stats.instances {
                println!("  {:<24} {}", key, copies);
            }
        }
        Commands::Clear => {
            store.clear()?;
            println!("OK");
            return Ok(());
        }
    }

    store.close()
}

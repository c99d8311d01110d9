//! kvwal CLI
//!
//! Opens a transaction log, replays it, and runs one command against it.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kvwal::wal::ApplyEvent;
use kvwal::{Config, Engine, Event, KvError, LogReplayer, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// kvwal CLI
#[derive(Parser, Debug)]
#[command(name = "kvwal")]
#[command(about = "Write-ahead-logged key-value store")]
#[command(version)]
struct Args {
    /// Transaction log file
    #[arg(short, long, default_value = "./kvwal_data/transaction.log")]
    log: PathBuf,

    /// Capacity of the writer's submission queue
    #[arg(short, long, default_value = "16")]
    buffer: usize,

    /// When the writer fsyncs the log
    #[arg(short, long, value_enum, default_value = "flush")]
    sync: SyncMode,

    /// Records between fsyncs for `--sync batch`
    #[arg(long, default_value = "100")]
    sync_every: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SyncMode {
    /// Flush to the OS after each record
    Flush,
    /// fsync after each record
    Always,
    /// fsync every `--sync-every` records
    Batch,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print every record in the log, checking order as replay does
    Dump,

    /// Replay the log into a scratch store and report
    Verify,

    /// Print the recovered key-value pairs
    Keys,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvwal=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(KvError::NotFound) => {
            eprintln!("not found");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> kvwal::Result<()> {
    let sync_strategy = match args.sync {
        SyncMode::Flush => WalSyncStrategy::FlushOnly,
        SyncMode::Always => WalSyncStrategy::EveryWrite,
        SyncMode::Batch => WalSyncStrategy::EveryNEntries {
            count: args.sync_every,
        },
    };

    let config = Config::builder()
        .log_path(&args.log)
        .buffer_capacity(args.buffer)
        .sync_strategy(sync_strategy)
        .build();

    match args.command {
        Commands::Dump => {
            let result = LogReplayer::replay_file(&args.log, &Printer)?;
            if result.torn_tail {
                tracing::warn!("Log ends in an unterminated record, not shown");
            }
            Ok(())
        }
        Commands::Verify => {
            let result = LogReplayer::verify(&args.log)?;
            println!("events:        {}", result.events_replayed);
            println!("puts:          {}", result.puts);
            println!("deletes:       {}", result.deletes);
            println!("last sequence: {}", result.last_sequence);
            println!("torn tail:     {}", result.torn_tail);
            Ok(())
        }
        command => {
            tracing::info!("kvwal v{}", kvwal::VERSION);
            let engine = Engine::open(config)?;
            let outcome = execute(&engine, command);
            engine.close()?;
            outcome
        }
    }
}

/// Writes each replayed event to stdout in its on-disk form
struct Printer;

impl ApplyEvent for Printer {
    fn apply(&self, event: &Event) {
        let _ = std::io::stdout().lock().write_all(&event.encode());
    }
}

fn execute(engine: &Engine, command: Commands) -> kvwal::Result<()> {
    match command {
        Commands::Get { key } => {
            println!("{}", engine.get(&key)?);
        }
        Commands::Put { key, value } => {
            let sequence = engine.put(key, value)?;
            tracing::debug!("Stored at sequence {}", sequence);
        }
        Commands::Delete { key } => {
            let sequence = engine.delete(key)?;
            tracing::debug!("Deleted at sequence {}", sequence);
        }
        Commands::Keys => {
            for (key, value) in engine.store().snapshot() {
                println!("{}\t{}", key, value);
            }
        }
        Commands::Dump | Commands::Verify => {}
    }
    Ok(())
}

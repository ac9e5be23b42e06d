use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use gamelens_core::{Config, MemoryReader, ProcessHandle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod shutdown;

#[derive(Parser)]
#[command(name = "gamelens")]
#[command(about = "Read-only observer for the game's entities, terrain and UI")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, default_value = "gamelens.toml", global = true)]
    config: PathBuf,

    /// Attach to this process id instead of searching by name
    #[arg(short, long, global = true)]
    pid: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Attach and tick until Ctrl-C or the game exits (default)
    Watch,
    /// Run a few ticks and print the current area as JSON
    Dump {
        /// Number of ticks before the snapshot
        #[arg(short, long, default_value = "3")]
        ticks: u32,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also include the string cache
        #[arg(long)]
        strings: bool,
    },
    /// Print raw bytes at an address
    Hexdump {
        /// Address (hex, with or without 0x)
        #[arg(short, long)]
        address: String,

        /// Number of bytes
        #[arg(short, long, default_value = "256")]
        size: usize,

        /// Show the ASCII column
        #[arg(long)]
        ascii: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gamelens=info".parse()?))
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => commands::watch::run(&config, args.pid),
        Command::Dump {
            ticks,
            output,
            strings,
        } => commands::dump::run(&config, args.pid, ticks, output.as_deref(), strings),
        Command::Hexdump {
            address,
            size,
            ascii,
        } => {
            let address = commands::hex_utils::parse_hex_address(&address)?;
            commands::hexdump::run(&config, args.pid, address, size, ascii)
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    match Config::load(path) {
        Ok(config) => Ok(config),
        Err(e) if e.is_not_found() => {
            warn!("Config {} not found, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Open the target process by pid, or by the configured executable name
pub(crate) fn open_reader(config: &Config, pid: Option<u32>) -> Result<MemoryReader> {
    let process = match pid {
        Some(pid) => ProcessHandle::open(pid)?,
        None => ProcessHandle::find_and_open(&config.process.name)?,
    };
    Ok(MemoryReader::new(process))
}

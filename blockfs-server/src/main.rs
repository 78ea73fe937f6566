//! `blockfsd`: serves a simulated disk backed by a single host file.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::error;

use blockfs_server::{FileSystem, server};

/// Serves a simulated disk over a line-oriented TCP protocol.
#[derive(Debug, Parser)]
#[command(name = "blockfsd", about, version)]
struct Cli {
    /// Path to the backing file. Created if it does not already exist.
    #[arg(long)]
    image: std::path::PathBuf,

    /// Name of the file system, for logging only.
    #[arg(long, default_value = "blockfs")]
    name: String,

    /// Accepted for interface compatibility; the on-disk layout is fixed
    /// regardless of this value.
    #[arg(long, default_value_t = 0)]
    size: u64,

    /// Address to bind the TCP listener to.
    #[arg(long, default_value = "127.0.0.1:7878")]
    bind: String,

    /// Number of worker threads servicing connections.
    #[arg(long, default_value_t = 4)]
    threads: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let fs = match FileSystem::open(&cli.image, cli.size) {
        Ok(fs) => Arc::new(fs),
        Err(e) => {
            error!("failed to open '{}' ({}): {e}", cli.image.display(), cli.name);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server::run(fs, &cli.bind, cli.threads) {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

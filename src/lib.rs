//! Snapshare — capture a screenshot, upload it, share the link.
//!
//! Wires together:
//! - Environment detection (environment.rs)
//! - Capture providers (capture/)
//! - Object storage upload (upload/)
//! - Local share history (history/)
//! - The capture workflow state machine (workflow/)

pub mod capture;
pub mod cli;
pub mod config;
pub mod environment;
pub mod history;
pub mod upload;
pub mod workflow;

use clap::Parser;

/// Entry point — called by the `snapshare` binary.
pub fn run() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = cli::Cli::parse();
    let config = config::Config::from_env();
    log::debug!("Snapshare starting with data dir {}", config.data_dir.display());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(cli::execute(cli, config)) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

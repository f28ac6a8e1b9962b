pub mod cli;
pub mod error;
pub mod evolve;
pub mod io_utils;
pub mod manifest;
pub mod merge;
pub mod merge_cmd;
pub mod preview;
pub mod row;
pub mod table;
pub mod transpose;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(level: LevelFilter) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_evolve", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(evolve::log_level(cli.debug));
    debug!("Quiet mode: {}, debug mode: {}", cli.quiet, cli.debug);
    match cli.command {
        Commands::Evolve(args) => evolve::execute(&args, cli.quiet, cli.debug),
        Commands::Merge(args) => merge_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}

use std::process;

use clap::Parser;
use log::LevelFilter;
use rsa_blocks::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose { LevelFilter::Trace } else { LevelFilter::Warn })
        .parse_default_env()
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

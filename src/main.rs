/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Main executable for lasdia-rs

use clap::Parser;
use lasdia_rs::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the -v flags when set
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    log::info!("lasdia-rs v{}", lasdia_rs::VERSION);
    cli::run(&cli)
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use edqrs::Cli;

fn main() {
    let cli = Cli::parse();
    edqrs::init_logging(cli.verbose, &cli.command);
    if let Err(e) = edqrs::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

//! CLI entry point for the grabbag utilities

use clap::Parser;
use grabbag::io::cli::{Cli, run};
use grabbag::io::logging::init_logging;

fn main() -> grabbag::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    run(cli)
}

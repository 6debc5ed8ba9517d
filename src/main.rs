use clap::Parser;

use postfe::{cli, logger};

fn main() -> std::process::ExitCode {
    // Session log overwrites the previous run's file.
    logger::init();

    let args = cli::CliArgs::parse();
    cli::run(args)
}

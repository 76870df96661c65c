use std::process::ExitCode;

use clap::Parser;
use loop_cmd::{LoopCmd, exit_status, handle_loop};

mod loop_cmd;

fn main() -> ExitCode {
    let cli = LoopCmd::parse();

    // stdout carries the command echo and device output
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    ExitCode::from(exit_status(handle_loop(cli)))
}

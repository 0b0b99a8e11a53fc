//! Cadence CLI - business-day task scheduling for small teams

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = cadence_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

//! taskgate - dependency validation for task graphs

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskgate::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

use std::process::ExitCode;

use cocirc::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(output) => {
            println!("{}", output.compartments_path.display());
            println!("{}", output.display_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

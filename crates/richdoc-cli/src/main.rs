use std::process;

use richdoc_cli::ExitCode;

fn main() {
    match richdoc_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("richdoc error: {err:#}");
            process::exit(ExitCode::Io.code());
        }
    }
}

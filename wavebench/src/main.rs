use std::process::ExitCode;

fn main() -> ExitCode {
    match wavebench::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(wavebench::exit_code(&e))
        }
    }
}

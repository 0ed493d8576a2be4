use std::process::ExitCode;

fn main() -> ExitCode {
    match luna::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            luna::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

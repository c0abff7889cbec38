use std::process::ExitCode;

fn main() -> ExitCode {
    studioplan_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    happytaps_cli::run()
}

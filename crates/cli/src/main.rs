use std::process::ExitCode;

fn main() -> ExitCode {
    changeorder_cli::run()
}

use std::process::ExitCode;

fn main() -> ExitCode {
    fieldsales_cli::run()
}

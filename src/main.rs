//! CLI entry point for hubqueue.

use std::process::ExitCode;

use hubqueue::run;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{}", report.render());
            report.error.exit_code()
        }
    }
}

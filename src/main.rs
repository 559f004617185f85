//! Binary entrypoint that launches the Justice AI terminal chat.

use std::process::ExitCode;

use justice_ai::start_justice_ai;

/// Start the chat against the configured classification endpoint.
fn main() -> ExitCode {
    start_justice_ai::run()
}

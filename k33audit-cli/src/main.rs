//! CLI entry point for `k33audit`.
//!
//! Parses command-line arguments with clap, initialises logging (which may
//! depend on `--log-file`), runs the audit, renders the summary to stdout, and
//! maps errors to a failing exit code.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use k33audit_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};
use tracing::{error, field};

/// Execute the parsed command, render the summary, and flush the output
/// stream.
fn try_main(cli: Cli) -> Result<()> {
    let summary = run_cli(cli).context("failed to execute command")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.log_file()) {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main(cli) {
        let codes = err
            .downcast_ref::<CliError>()
            .map(|CliError::Core(core)| (core.code(), core.root_code(), core.oracle_code()));

        let code_field = codes.map(|(code, _, _)| field::display(code.as_str()));
        let root_code_field = codes.map(|(_, root, _)| field::display(root.as_str()));
        let oracle_code_field = codes
            .and_then(|(_, _, oracle)| oracle)
            .map(|code| field::display(code.as_str()));

        error!(
            error = %err,
            code = code_field,
            root_code = root_code_field,
            oracle_code = oracle_code_field,
            "command execution failed"
        );
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}

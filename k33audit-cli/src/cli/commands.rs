//! Command implementations and argument parsing for the `k33audit` CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use k33audit_core::{
    AuditError, AuditErrorCode, BatchConfig, BatchDriver, BatchReport, DEFAULT_MAX_MISSED,
    DEFAULT_OUTPUT_ROOT, Edge, GraphAnalysis, RecordOutcome, RecordReport, SearchOptions,
    oracle::PlanarityProcess,
};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "k33audit",
    about = "Check a planarity engine's K3,3 search by edge deletion."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Log file requested on the command line, if any.
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        match &self.command {
            Command::Analyze(command) => command.log_file.as_deref(),
        }
    }
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Analyse every graph of a graph6 collection.
    Analyze(AnalyzeCommand),
}

/// Options accepted by the `analyze` command.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeCommand {
    /// Path to the `planarity` executable.
    #[arg(long)]
    pub planarity: PathBuf,

    /// graph6 collection to analyse, one graph per line.
    #[arg(long)]
    pub input: PathBuf,

    /// Root under which the per-input results directory is created.
    #[arg(long = "output-dir", default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_dir: PathBuf,

    /// Stop once more than this many missed-K3,3 findings were seen.
    #[arg(
        long = "max-missed",
        default_value_t = DEFAULT_MAX_MISSED,
        value_parser = clap::value_parser!(usize),
    )]
    pub max_missed: usize,

    /// Abort the whole run on the first record that fails.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Scan neighbour sequences in file order instead of sorting them.
    #[arg(long = "preserve-adjacency-order")]
    pub preserve_adjacency_order: bool,

    /// Also write every log event to this file.
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,
}

impl AnalyzeCommand {
    pub(super) fn batch_config(&self) -> BatchConfig {
        BatchConfig::new(&self.input)
            .with_output_root(&self.output_dir)
            .with_max_missed(self.max_missed)
            .with_fail_fast(self.fail_fast)
            .with_search_options(
                SearchOptions::new().with_sort_adjacency(!self.preserve_adjacency_order),
            )
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The analysis library failed.
    #[error(transparent)]
    Core(#[from] AuditError),
}

/// How one record ended, reduced to what the summary prints.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordStatus {
    /// The K3,3 search reported a K3,3.
    K33Reported,
    /// The graph is planar.
    Planar,
    /// The embedder isolated a K3,3 the search had missed.
    MissedK33,
    /// The edge-deletion search ran.
    EdgeDeletion {
        /// Number of single-edge trials.
        trials: usize,
        /// Trial edges whose deletion exposed a K3,3.
        evidence: Vec<Edge>,
    },
    /// The record failed.
    Failed {
        /// Code of the underlying error.
        code: AuditErrorCode,
        /// Rendered error message.
        message: String,
    },
}

/// One line of the run summary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordSummary {
    /// One-based record number.
    pub record: usize,
    /// Whether the record's working directory was kept.
    pub retained: bool,
    /// Outcome.
    pub status: RecordStatus,
}

impl From<&RecordReport> for RecordSummary {
    fn from(report: &RecordReport) -> Self {
        let status = match &report.outcome {
            RecordOutcome::Analysed(GraphAnalysis::K33Reported) => RecordStatus::K33Reported,
            RecordOutcome::Analysed(GraphAnalysis::Planar) => RecordStatus::Planar,
            RecordOutcome::Analysed(GraphAnalysis::MissedK33 { .. }) => RecordStatus::MissedK33,
            RecordOutcome::Analysed(GraphAnalysis::EdgeDeletion(verdict)) => {
                RecordStatus::EdgeDeletion {
                    trials: verdict.trials().len(),
                    evidence: verdict.evidence(),
                }
            }
            RecordOutcome::Failed(err) => RecordStatus::Failed {
                code: err.root_code(),
                message: err.to_string(),
            },
        };
        Self {
            record: report.record,
            retained: report.retained,
            status,
        }
    }
}

/// Summarises a completed `analyze` run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunSummary {
    /// Directory holding the run's artefacts.
    pub output_dir: PathBuf,
    /// Per-record outcomes in input order.
    pub records: Vec<RecordSummary>,
    /// Records whose analysis completed.
    pub analysed: usize,
    /// Missed-K3,3 findings.
    pub missed: usize,
    /// Records that failed.
    pub failed: usize,
    /// Whether the run stopped early on the missed-finding ceiling.
    pub tripped: bool,
}

impl From<&BatchReport> for RunSummary {
    fn from(report: &BatchReport) -> Self {
        Self {
            output_dir: report.output_dir().to_path_buf(),
            records: report.records().iter().map(RecordSummary::from).collect(),
            analysed: report.analysed(),
            missed: report.missed(),
            failed: report.failed(),
            tripped: report.tripped(),
        }
    }
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when the run cannot start, or when a record fails
/// under `--fail-fast`.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<RunSummary, CliError> {
    match cli.command {
        Command::Analyze(command) => {
            Span::current().record("command", field::display("analyze"));
            run_analyze(&command)
        }
    }
}

#[instrument(
    name = "cli.analyze",
    err,
    skip(command),
    fields(
        input = %command.input.display(),
        planarity = %command.planarity.display(),
        max_missed = command.max_missed,
        fail_fast = command.fail_fast,
    ),
)]
pub(super) fn run_analyze(command: &AnalyzeCommand) -> Result<RunSummary, CliError> {
    let oracle = PlanarityProcess::new(&command.planarity)?;
    let report = BatchDriver::new(command.batch_config(), oracle).run()?;
    let summary = RunSummary::from(&report);
    if summary.tripped {
        warn!(missed = summary.missed, "run stopped at the missed-finding ceiling");
    }
    info!(
        analysed = summary.analysed,
        missed = summary.missed,
        failed = summary.failed,
        output = %summary.output_dir.display(),
        "analysis complete"
    );
    Ok(summary)
}

/// Writes a human-readable summary to `writer`.
///
/// One tab-separated line per record is followed by the totals.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use std::path::PathBuf;
/// # use k33audit_cli::cli::{RecordStatus, RecordSummary, RunSummary, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = RunSummary {
///     output_dir: PathBuf::from("results/n5"),
///     records: vec![RecordSummary {
///         record: 1,
///         retained: false,
///         status: RecordStatus::Planar,
///     }],
///     analysed: 1,
///     missed: 0,
///     failed: 0,
///     tripped: false,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert!(text.starts_with("output: results/n5\n1\tplanar\n"));
/// assert!(text.ends_with("circuit breaker: not tripped\n"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &RunSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "output: {}", summary.output_dir.display())?;
    for record in &summary.records {
        write!(writer, "{}\t", record.record)?;
        match &record.status {
            RecordStatus::K33Reported => writeln!(writer, "k33 reported")?,
            RecordStatus::Planar => writeln!(writer, "planar")?,
            RecordStatus::MissedK33 => writeln!(writer, "MISSED K3,3 (obstruction)")?,
            RecordStatus::EdgeDeletion { trials, evidence } if evidence.is_empty() => {
                writeln!(writer, "edge deletion: {trials} trials, nothing missed")?;
            }
            RecordStatus::EdgeDeletion { trials, evidence } => {
                let edges = evidence
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(
                    writer,
                    "MISSED K3,3 (edge deletion): {trials} trials, evidence {edges}"
                )?;
            }
            RecordStatus::Failed { code, message } => {
                writeln!(writer, "failed [{code}]: {message}")?;
            }
        }
    }
    writeln!(writer, "analysed: {}", summary.analysed)?;
    writeln!(writer, "missed K3,3: {}", summary.missed)?;
    writeln!(writer, "failed: {}", summary.failed)?;
    let breaker = if summary.tripped {
        "tripped"
    } else {
        "not tripped"
    };
    writeln!(writer, "circuit breaker: {breaker}")?;
    Ok(())
}

//! Batch driver: runs the analysis pipeline over every record of a graph6
//! collection.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{Span, debug, error, field, info, instrument, warn};

use crate::{
    analysis::{AnalysisContext, GraphAnalysis, GraphAnalyzer},
    error::{AuditError, FormatError, PathError, Result},
    format::{GRAPH6_HEADER, InputFormat, detect_input_format},
    layout::{DEFAULT_OUTPUT_ROOT, OutputLayout},
    oracle::Oracle,
    search::SearchOptions,
};

/// Default ceiling on missed-K3,3 findings before a run stops early.
pub const DEFAULT_MAX_MISSED: usize = 1000;

/// Settings for a [`BatchDriver`] run.
///
/// # Examples
/// ```
/// use k33audit_core::BatchConfig;
///
/// let config = BatchConfig::new("graphs/n6.m12.g6")
///     .with_output_root("/tmp/k33")
///     .with_max_missed(5)
///     .with_fail_fast(true);
/// assert_eq!(config.max_missed(), 5);
/// assert!(config.fail_fast());
/// assert!(config.search_options().sort_adjacency());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchConfig {
    input: PathBuf,
    output_root: PathBuf,
    max_missed: usize,
    fail_fast: bool,
    search: SearchOptions,
}

impl BatchConfig {
    /// Creates a configuration for `input` with default settings.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            max_missed: DEFAULT_MAX_MISSED,
            fail_fast: false,
            search: SearchOptions::default(),
        }
    }

    /// Sets the directory results are written under.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Sets how many missed-K3,3 findings are tolerated before the run stops.
    #[must_use]
    pub fn with_max_missed(mut self, max_missed: usize) -> Self {
        self.max_missed = max_missed;
        self
    }

    /// Aborts the whole run on the first failing record when `true`.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Replaces the options handed to the edge-deletion search.
    #[must_use]
    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.search = options;
        self
    }

    /// Input collection.
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Directory results are written under.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Ceiling on missed-K3,3 findings.
    #[must_use]
    pub fn max_missed(&self) -> usize {
        self.max_missed
    }

    /// Whether a failing record aborts the run.
    #[must_use]
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Options handed to the edge-deletion search.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        self.search
    }
}

/// How one record fared.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The pipeline completed.
    Analysed(GraphAnalysis),
    /// The pipeline failed; the error carries the record context.
    Failed(AuditError),
}

/// Result of processing one record.
#[derive(Debug)]
pub struct RecordReport {
    /// One-based line number within the collection.
    pub record: usize,
    /// Working directory of the record.
    pub dir: PathBuf,
    /// Whether the working directory was kept for inspection.
    pub retained: bool,
    /// What happened.
    pub outcome: RecordOutcome,
}

impl RecordReport {
    /// Returns `true` when the record is a missed-K3,3 finding.
    #[must_use]
    pub fn missed_k33(&self) -> bool {
        matches!(&self.outcome, RecordOutcome::Analysed(analysis) if analysis.missed_k33())
    }
}

/// Result of a complete batch run.
#[derive(Debug)]
pub struct BatchReport {
    output_dir: PathBuf,
    records: Vec<RecordReport>,
    tripped: bool,
}

impl BatchReport {
    /// Directory holding the run's artefacts.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Every processed record, in input order.
    #[must_use]
    pub fn records(&self) -> &[RecordReport] {
        &self.records
    }

    /// Returns `true` when the run stopped because too many missed K3,3
    /// findings accumulated.
    #[must_use]
    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// Number of records whose pipeline completed.
    #[must_use]
    pub fn analysed(&self) -> usize {
        self.records
            .iter()
            .filter(|report| matches!(report.outcome, RecordOutcome::Analysed(_)))
            .count()
    }

    /// Number of missed-K3,3 findings.
    #[must_use]
    pub fn missed(&self) -> usize {
        self.records.iter().filter(|report| report.missed_k33()).count()
    }

    /// Number of records whose pipeline failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|report| matches!(report.outcome, RecordOutcome::Failed(_)))
            .count()
    }
}

/// Runs the per-graph pipeline over a graph6 collection.
///
/// Records are processed one at a time, each in its own working directory.
/// A failing record is logged and reported while the run moves on, unless
/// [`BatchConfig::fail_fast`] is set. Directories of records without a
/// finding are removed; findings and failures are kept for inspection.
#[derive(Debug)]
pub struct BatchDriver<O> {
    config: BatchConfig,
    analyzer: GraphAnalyzer<O>,
}

impl<O: Oracle> BatchDriver<O> {
    /// Creates a driver issuing its queries to `oracle`.
    #[must_use]
    pub fn new(config: BatchConfig, oracle: O) -> Self {
        let analyzer = GraphAnalyzer::new(oracle).with_search_options(config.search_options());
        Self { config, analyzer }
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Processes every record of the input collection.
    ///
    /// # Errors
    /// Returns [`AuditError::Path`], [`AuditError::Io`] or
    /// [`AuditError::Format`] when the run cannot start, including
    /// [`FormatError::UnsupportedEncoding`] for anything but graph6 input.
    /// With fail-fast enabled the first failing record is returned as
    /// [`AuditError::Record`].
    #[instrument(
        name = "batch.run",
        err,
        skip(self),
        fields(
            input = %self.config.input().display(),
            records = field::Empty,
            missed = field::Empty,
            failed = field::Empty,
        ),
    )]
    pub fn run(&self) -> Result<BatchReport> {
        let input = self.config.input();
        if !input.is_file() {
            return Err(AuditError::Path {
                path: input.to_path_buf(),
                source: PathError::NotAFile,
            });
        }
        let format = detect_input_format(input)?;
        if format != InputFormat::Graph6 {
            return Err(AuditError::format(
                input,
                FormatError::UnsupportedEncoding { found: format },
            ));
        }

        let layout = OutputLayout::prepare(input, self.config.output_root())?;
        let copy = layout.input_copy();
        let text = fs::read_to_string(&copy).map_err(|source| AuditError::io(&copy, source))?;

        let mut records = Vec::new();
        let mut missed = 0;
        let mut tripped = false;
        for (index, raw) in text.lines().enumerate() {
            let record = index + 1;
            let raw = if record == 1 {
                raw.strip_prefix(GRAPH6_HEADER).unwrap_or(raw)
            } else {
                raw
            };
            let line = raw.trim();
            if line.is_empty() {
                debug!(record, "skipping blank record");
                continue;
            }

            let report = self.record(&layout, record, line)?;
            if report.missed_k33() {
                missed += 1;
            }
            records.push(report);
            if missed > self.config.max_missed() {
                error!(
                    max_missed = self.config.max_missed(),
                    "encountered more missed K_{{3,3}} findings than supported; stopping"
                );
                tripped = true;
                break;
            }
        }

        let report = BatchReport {
            output_dir: layout.dir().to_path_buf(),
            records,
            tripped,
        };
        let span = Span::current();
        span.record("records", report.records().len());
        span.record("missed", report.missed());
        span.record("failed", report.failed());
        info!(
            records = report.records().len(),
            missed = report.missed(),
            failed = report.failed(),
            tripped,
            "batch finished"
        );
        Ok(report)
    }

    fn record(&self, layout: &OutputLayout, record: usize, line: &str) -> Result<RecordReport> {
        let dir = layout.record_dir(record);
        let context = AnalysisContext::for_record(record, &dir);
        match self.analyse_record(layout, &context, line) {
            Ok(analysis) => {
                let retained = analysis.missed_k33();
                if !retained {
                    if let Err(err) = layout.discard_record(record) {
                        warn!(record, error = %err, "unable to remove record directory");
                    }
                }
                Ok(RecordReport {
                    record,
                    dir,
                    retained,
                    outcome: RecordOutcome::Analysed(analysis),
                })
            }
            Err(source) => {
                let err = AuditError::Record {
                    record,
                    input: self.config.input().to_path_buf(),
                    source: Box::new(source),
                };
                error!(
                    record,
                    error = %err,
                    cause = %err.root(),
                    code = %err.root_code(),
                    "record analysis failed"
                );
                if self.config.fail_fast() {
                    return Err(err);
                }
                Ok(RecordReport {
                    record,
                    dir,
                    retained: true,
                    outcome: RecordOutcome::Failed(err),
                })
            }
        }
    }

    #[instrument(
        name = "batch.record",
        err,
        parent = context.span(),
        skip_all,
        fields(record = context.record()),
    )]
    fn analyse_record(
        &self,
        layout: &OutputLayout,
        context: &AnalysisContext,
        line: &str,
    ) -> Result<GraphAnalysis> {
        let record = context.record().unwrap_or_default();
        let graph_file = layout.write_record(record, line)?;
        self.analyzer.analyze_file(context, &graph_file)
    }
}

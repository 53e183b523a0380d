//! Small helpers shared across CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

use k33audit_test_support::{
    fixtures::collection,
    planarity::{FakePlanarity, InstalledPlanarity},
};
use tempfile::TempDir;

use super::{AnalyzeCommand, Cli, CliError, Command, run_cli};

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

#[cfg(unix)]
pub(super) fn install(dir: &TempDir, fake: &FakePlanarity) -> InstalledPlanarity {
    let bin = dir.path().join("bin");
    fs::create_dir_all(&bin).expect("bin dir");
    fake.install(&bin).expect("install fake planarity")
}

pub(super) fn write_collection(dir: &TempDir, records: &[&str]) -> PathBuf {
    let path = dir.path().join("n5.g6");
    fs::write(&path, collection(records, true)).expect("write collection");
    path
}

pub(super) fn analyze(planarity: &Path, input: &Path, output_dir: &Path) -> AnalyzeCommand {
    AnalyzeCommand {
        planarity: planarity.to_path_buf(),
        input: input.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        max_missed: k33audit_core::DEFAULT_MAX_MISSED,
        fail_fast: false,
        preserve_adjacency_order: false,
        log_file: None,
    }
}

pub(super) fn run_cli_expecting_error(command: AnalyzeCommand, panic_msg: &str) -> CliError {
    match run_cli(Cli {
        command: Command::Analyze(command),
    }) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}

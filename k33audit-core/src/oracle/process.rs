//! [`Oracle`] backed by the `planarity` executable.

use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{Span, field, info, instrument};

use super::{
    Artifacts, EmbedOutcome, EngineOutput, EngineResult, K33SearchOutcome, Oracle, OracleQuery,
    interpret,
};
use crate::error::{AuditError, OracleError, PathError, Result};

/// Runs the planarity engine as a child process.
///
/// The engine limits the length of the file names it accepts, so each child
/// is started with its working directory set to the directory holding the
/// input and receives bare file names. The working directory of the calling
/// process is never touched, which keeps concurrent analyses in different
/// directories independent.
#[derive(Clone, Debug)]
pub struct PlanarityProcess {
    executable: PathBuf,
}

impl PlanarityProcess {
    /// Resolves `executable` and checks that it can be run.
    ///
    /// A bare program name is looked up on `PATH`.
    ///
    /// # Errors
    /// Returns [`AuditError::Path`] with [`PathError::NotExecutable`] when no
    /// executable file can be found.
    pub fn new(executable: impl Into<PathBuf>) -> Result<Self> {
        let requested = executable.into();
        let not_executable = || AuditError::Path {
            path: requested.clone(),
            source: PathError::NotExecutable,
        };
        let candidate = if requested.components().count() == 1 && !requested.is_file() {
            search_path(&requested).ok_or_else(not_executable)?
        } else {
            requested.clone()
        };
        if !is_executable(&candidate) {
            return Err(not_executable());
        }
        let executable = fs::canonicalize(&candidate).map_err(|_| not_executable())?;
        Ok(Self { executable })
    }

    /// Returns the resolved executable path.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(
        &self,
        query: OracleQuery,
        graph_file: &Path,
        args: &[OsString],
    ) -> core::result::Result<EngineOutput, OracleError> {
        let artifacts = Artifacts::for_input(graph_file);
        let output = Command::new(&self.executable)
            .current_dir(artifacts.dir())
            .args(args)
            .output()
            .map_err(|source| OracleError::Spawn {
                program: self.executable.clone(),
                query,
                source,
            })?;
        Ok(EngineOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn search_path(program: &Path) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn file_name(path: &Path) -> OsString {
    path.file_name()
        .map_or_else(|| path.as_os_str().to_owned(), ToOwned::to_owned)
}

impl Oracle for PlanarityProcess {
    #[instrument(
        name = "oracle.transform",
        err,
        skip(self),
        fields(graph = %graph_file.display(), output = field::Empty),
    )]
    fn transform_to_adjacency_list(&self, graph_file: &Path) -> Result<PathBuf> {
        let output = Artifacts::for_input(graph_file).adjacency_list();
        Span::current().record("output", field::display(output.display()));
        let args = [
            OsString::from("-t"),
            OsString::from("-ta"),
            file_name(graph_file),
            file_name(&output),
        ];
        let engine = self.run(OracleQuery::Transform, graph_file, &args)?;
        interpret(OracleQuery::Transform, graph_file, engine)?;
        Ok(output)
    }

    #[instrument(
        name = "oracle.k33_search",
        err,
        skip(self),
        fields(graph = %graph_file.display(), outcome = field::Empty),
    )]
    fn search_for_k33(&self, graph_file: &Path) -> Result<K33SearchOutcome> {
        let report = Artifacts::for_input(graph_file).k33_report();
        let args = [
            OsString::from("-s"),
            OsString::from("-3"),
            file_name(graph_file),
            file_name(&report),
        ];
        let engine = self.run(OracleQuery::K33Search, graph_file, &args)?;
        let outcome = match interpret(OracleQuery::K33Search, graph_file, engine)? {
            EngineResult::Ok => K33SearchOutcome::NoK33,
            EngineResult::NonEmbeddable => K33SearchOutcome::ContainsK33,
        };
        Span::current().record("outcome", field::debug(outcome));
        info!(graph = %graph_file.display(), report = %report.display(), ?outcome, "K_{{3,3}} search finished");
        Ok(outcome)
    }

    #[instrument(
        name = "oracle.planar_embed",
        err,
        skip(self),
        fields(graph = %graph_file.display(), planar = field::Empty),
    )]
    fn planar_embed(&self, graph_file: &Path) -> Result<EmbedOutcome> {
        let artifacts = Artifacts::for_input(graph_file);
        let embedding = artifacts.embedding();
        let obstruction = artifacts.obstruction();
        let args = [
            OsString::from("-s"),
            OsString::from("-p"),
            file_name(graph_file),
            file_name(&embedding),
            file_name(&obstruction),
        ];
        let engine = self.run(OracleQuery::PlanarEmbed, graph_file, &args)?;
        let outcome = match interpret(OracleQuery::PlanarEmbed, graph_file, engine)? {
            EngineResult::Ok => {
                info!(graph = %graph_file.display(), embedding = %embedding.display(), "graph is planar");
                EmbedOutcome::Planar
            }
            EngineResult::NonEmbeddable => {
                info!(graph = %graph_file.display(), obstruction = %obstruction.display(), "graph is not planar");
                EmbedOutcome::Nonplanar { obstruction }
            }
        };
        Span::current().record("planar", matches!(outcome, EmbedOutcome::Planar));
        Ok(outcome)
    }
}

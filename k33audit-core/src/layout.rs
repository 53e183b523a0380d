//! On-disk layout of a batch run.
//!
//! ```text
//! <output root>/<input stem>/
//!     <input name>                  copy of the collection
//!     <input name>.<N>/             one directory per record
//!         <input name>.<N>.g6
//!         <input name>.<N>.AdjList.out.txt
//!         ...
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use crate::{
    error::{AuditError, PathError, Result},
    format::GRAPH6_SUFFIX,
};

/// Default directory results are written under.
pub const DEFAULT_OUTPUT_ROOT: &str = "results/edge_deletion_analysis";

/// Directory tree owned by one batch run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputLayout {
    dir: PathBuf,
    input_name: String,
}

impl OutputLayout {
    /// Creates `<output_root>/<input stem>/`, wiping any previous run, and
    /// copies `input` into it.
    ///
    /// The returned layout holds absolute paths.
    ///
    /// # Errors
    /// Returns [`AuditError::Path`] when `input` is not a file, lies inside
    /// the directory that would be wiped, or `output_root` is an existing
    /// file, and [`AuditError::Io`] when the
    /// directory cannot be prepared.
    #[instrument(name = "layout.prepare", err, fields(input = %input.display(), root = %output_root.display()))]
    pub fn prepare(input: &Path, output_root: &Path) -> Result<Self> {
        let not_a_file = || AuditError::Path {
            path: input.to_path_buf(),
            source: PathError::NotAFile,
        };
        if !input.is_file() {
            return Err(not_a_file());
        }
        if output_root.is_file() {
            return Err(AuditError::Path {
                path: output_root.to_path_buf(),
                source: PathError::IsAFile,
            });
        }
        let (Some(stem), Some(name)) = (input.file_stem(), input.file_name()) else {
            return Err(not_a_file());
        };

        let dir = output_root.join(stem);
        if dir.exists() {
            let existing = fs::canonicalize(&dir).map_err(|source| AuditError::io(&dir, source))?;
            let source_file =
                fs::canonicalize(input).map_err(|source| AuditError::io(input, source))?;
            if source_file.starts_with(&existing) {
                return Err(AuditError::Path {
                    path: input.to_path_buf(),
                    source: PathError::InsideOutput,
                });
            }
            debug!(dir = %dir.display(), "removing results of a previous run");
            fs::remove_dir_all(&dir).map_err(|source| AuditError::io(&dir, source))?;
        }
        fs::create_dir_all(&dir).map_err(|source| AuditError::io(&dir, source))?;
        let dir = fs::canonicalize(&dir).map_err(|source| AuditError::io(&dir, source))?;

        let input_name = name.to_string_lossy().into_owned();
        let copy = dir.join(&input_name);
        fs::copy(input, &copy).map_err(|source| AuditError::io(&copy, source))?;
        Ok(Self { dir, input_name })
    }

    /// Directory holding every artefact of the run.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copy of the input collection.
    #[must_use]
    pub fn input_copy(&self) -> PathBuf {
        self.dir.join(&self.input_name)
    }

    /// Working directory of record `record`.
    #[must_use]
    pub fn record_dir(&self, record: usize) -> PathBuf {
        self.dir.join(self.record_name(record))
    }

    /// Writes `line` as the single-graph file of record `record`, creating
    /// its working directory, and returns the file's path.
    ///
    /// # Errors
    /// Returns [`AuditError::Io`] when the directory or file cannot be
    /// written.
    pub fn write_record(&self, record: usize, line: &str) -> Result<PathBuf> {
        let dir = self.record_dir(record);
        fs::create_dir_all(&dir).map_err(|source| AuditError::io(&dir, source))?;
        let path = dir.join(format!("{}.{GRAPH6_SUFFIX}", self.record_name(record)));
        fs::write(&path, format!("{line}\n")).map_err(|source| AuditError::io(&path, source))?;
        Ok(path)
    }

    /// Removes the working directory of record `record`.
    ///
    /// # Errors
    /// Returns [`AuditError::Io`] when the directory exists but cannot be
    /// removed.
    pub fn discard_record(&self, record: usize) -> Result<()> {
        let dir = self.record_dir(record);
        if !dir.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&dir).map_err(|source| AuditError::io(&dir, source))
    }

    fn record_name(&self, record: usize) -> String {
        format!("{}.{record}", self.input_name)
    }
}

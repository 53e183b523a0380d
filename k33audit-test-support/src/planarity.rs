//! Scripted stand-in for the `planarity` executable.
//!
//! [`FakePlanarity::install`] writes a POSIX shell script that answers the
//! three invocations used by the process adapter with canned output and
//! appends `<physical working dir>|<arguments>` to a call log for every run.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Canned answer for one query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reply {
    /// Exit code.
    pub status: i32,
    /// Text printed on standard output.
    pub stdout: String,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    pub fn new(status: i32, stdout: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
        }
    }
}

/// Builder for a scripted `planarity` executable.
///
/// # Examples
/// ```
/// use k33audit_test_support::{fixtures::TRIANGLE_ADJACENCY_LIST, planarity::FakePlanarity};
///
/// let fake = FakePlanarity::new(TRIANGLE_ADJACENCY_LIST).with_embedding(
///     1,
///     "The graph is not planar.",
///     Some(TRIANGLE_ADJACENCY_LIST),
/// );
/// assert_eq!(fake.embedding().status, 1);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FakePlanarity {
    transform: String,
    k33_search: Reply,
    embedding: Reply,
    obstruction: Option<String>,
}

impl FakePlanarity {
    /// Creates a fake whose transform writes `adjacency_list` and which
    /// reports every graph as K3,3-free and planar.
    #[must_use]
    pub fn new(adjacency_list: impl Into<String>) -> Self {
        Self {
            transform: adjacency_list.into(),
            k33_search: Reply::new(0, "The graph has no subgraph homeomorphic to K_{3,3}."),
            embedding: Reply::new(0, "The graph is planar."),
            obstruction: None,
        }
    }

    /// Sets the answer to `-s -3`.
    #[must_use]
    pub fn with_k33_search(mut self, status: i32, stdout: impl Into<String>) -> Self {
        self.k33_search = Reply::new(status, stdout);
        self
    }

    /// Sets the answer to `-s -p`, writing `obstruction` to the obstruction
    /// file when given.
    #[must_use]
    pub fn with_embedding(
        mut self,
        status: i32,
        stdout: impl Into<String>,
        obstruction: Option<&str>,
    ) -> Self {
        self.embedding = Reply::new(status, stdout);
        self.obstruction = obstruction.map(str::to_owned);
        self
    }

    /// Answer to `-s -3`.
    #[must_use]
    pub fn k33_search(&self) -> &Reply {
        &self.k33_search
    }

    /// Answer to `-s -p`.
    #[must_use]
    pub fn embedding(&self) -> &Reply {
        &self.embedding
    }

    /// Writes the script and an empty call log into `dir`.
    ///
    /// # Errors
    /// Returns any I/O error raised while writing the files.
    #[cfg(unix)]
    pub fn install(&self, dir: &Path) -> io::Result<InstalledPlanarity> {
        use std::os::unix::fs::PermissionsExt;

        let executable = dir.join("planarity");
        let log = dir.join("planarity.calls");
        fs::write(&log, "")?;
        fs::write(&executable, self.script(&log))?;
        let mut permissions = fs::metadata(&executable)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&executable, permissions)?;
        Ok(InstalledPlanarity { executable, log })
    }

    fn script(&self, log: &Path) -> String {
        let obstruction = self.obstruction.as_deref().map_or_else(String::new, |text| {
            format!("printf '%s' {} > \"$5\"\n    ", quote(text))
        });
        format!(
            "#!/bin/sh\n\
             printf '%s|%s\\n' \"$(pwd -P)\" \"$*\" >> {log}\n\
             case \"$1 $2\" in\n\
             \"-t -ta\")\n    printf '%s' {transform} > \"$4\"\n    exit 0 ;;\n\
             \"-s -3\")\n    printf '%s\\n' {k33_stdout}\n    exit {k33_status} ;;\n\
             \"-s -p\")\n    {obstruction}printf '%s\\n' {embed_stdout}\n    exit {embed_status} ;;\n\
             esac\n\
             echo \"unsupported invocation: $*\" >&2\n\
             exit 255\n",
            log = quote(&log.to_string_lossy()),
            transform = quote(&self.transform),
            k33_stdout = quote(&self.k33_search.stdout),
            k33_status = self.k33_search.status,
            embed_stdout = quote(&self.embedding.stdout),
            embed_status = self.embedding.status,
        )
    }
}

/// Single-quotes `text` for the shell.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Paths of an installed fake.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstalledPlanarity {
    /// The executable script.
    pub executable: PathBuf,
    /// Call log, one `<working dir>|<arguments>` line per run.
    pub log: PathBuf,
}

impl InstalledPlanarity {
    /// Calls made so far as `(working dir, arguments)` pairs.
    ///
    /// # Errors
    /// Returns any I/O error raised while reading the log.
    pub fn calls(&self) -> io::Result<Vec<(PathBuf, String)>> {
        Ok(fs::read_to_string(&self.log)?
            .lines()
            .filter_map(|line| line.split_once('|'))
            .map(|(dir, args)| (PathBuf::from(dir), args.to_owned()))
            .collect())
    }
}

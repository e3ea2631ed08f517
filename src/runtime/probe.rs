//! Runtime probe: find the interpreter and read its version.
//!
//! The probe is read-only. It walks the PATH entries it was given (the
//! host PATH by default) in order, runs `<exe> --version` once, and
//! checks the result against the configured minimum. There is no retry
//! and no search beyond PATH: a missing interpreter is a setup problem
//! for the operator to fix, not a transient fault.
//!
//! # Example
//!
//! ```no_run
//! use tracker_setup::runtime::{RuntimeProber, Version};
//! use tracker_setup::shell::SystemRunner;
//!
//! let prober = RuntimeProber::new(&SystemRunner, "python3", Version::new(3, 8, 0));
//! let runtime = prober.probe().unwrap();
//! println!("{} {}", runtime.executable.display(), runtime.version);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SetupError};
use crate::shell::{absolutize, is_not_found, CommandRunner, CommandSpec};

use super::version::Version;

/// A probed interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDescriptor {
    /// Absolute path of the interpreter.
    pub executable: PathBuf,
    /// Version reported by the interpreter.
    pub version: Version,
}

/// Why a runtime probe failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    /// No executable with that name on PATH.
    NotFound,
    /// The version query could not run or exited non-zero.
    VersionQueryFailed { detail: String },
    /// The version query ran but printed no recognizable version.
    Unparsable { output: String },
    /// The interpreter is older than required.
    BelowMinimum { found: Version, minimum: Version },
}

impl MissingReason {
    /// What the operator should do about it.
    pub fn hint(&self) -> String {
        match self {
            Self::NotFound => {
                "Install Python 3 and make sure it is on PATH, or set runtime.executable".to_string()
            }
            Self::VersionQueryFailed { .. } | Self::Unparsable { .. } => {
                "Check that runtime.executable points at a working Python interpreter".to_string()
            }
            Self::BelowMinimum { minimum, .. } => {
                format!("Install Python {} or newer and re-run setup", minimum)
            }
        }
    }
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "executable not found on PATH"),
            Self::VersionQueryFailed { detail } => write!(f, "version query failed: {}", detail),
            Self::Unparsable { output } => {
                write!(f, "could not parse version from output '{}'", output.trim())
            }
            Self::BelowMinimum { found, minimum } => {
                write!(f, "version {} is older than required {}", found, minimum)
            }
        }
    }
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// File names to try for `tool` in each PATH directory.
///
/// On Windows a bare name is tried with every `PATHEXT` suffix.
fn candidate_names(tool: &str) -> Vec<String> {
    if cfg!(windows) && Path::new(tool).extension().is_none() {
        let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".into());
        let mut names: Vec<String> = pathext
            .split(';')
            .filter(|e| !e.is_empty())
            .map(|ext| format!("{}{}", tool, ext.to_lowercase()))
            .collect();
        names.push(tool.to_string());
        names
    } else {
        vec![tool.to_string()]
    }
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable. Does NOT use
/// the `which` command, whose behavior varies across systems.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    let names = candidate_names(tool);
    for dir in path_entries {
        for name in &names {
            let candidate = dir.join(name);
            if candidate.is_file() && is_executable(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Parse the system PATH environment variable into a list of directories.
pub fn parse_system_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Locates the interpreter and gates it on a minimum version.
pub struct RuntimeProber<'a> {
    runner: &'a dyn CommandRunner,
    executable: String,
    minimum: Version,
    search_path: Vec<PathBuf>,
    base_dir: PathBuf,
}

impl<'a> RuntimeProber<'a> {
    /// Create a prober that searches the host PATH.
    pub fn new(runner: &'a dyn CommandRunner, executable: &str, minimum: Version) -> Self {
        Self {
            runner,
            executable: executable.to_string(),
            minimum,
            search_path: parse_system_path(),
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Search these directories instead of the host PATH.
    pub fn with_search_path(mut self, search_path: Vec<PathBuf>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Directory used to absolutize relative PATH entries and explicit
    /// relative executable paths.
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        self.base_dir = base_dir.to_path_buf();
        self
    }

    /// The configured executable name or path.
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Find the interpreter on disk without running it.
    pub fn locate(&self) -> Option<PathBuf> {
        let exe = Path::new(&self.executable);
        let found = if exe.components().count() > 1 || exe.is_absolute() {
            // Explicit path: used verbatim, no PATH search
            let path = absolutize(exe, &self.base_dir);
            (path.is_file() && is_executable(&path)).then_some(path)
        } else {
            let entries: Vec<PathBuf> = self
                .search_path
                .iter()
                .map(|dir| absolutize(dir, &self.base_dir))
                .collect();
            resolve_tool_path(&self.executable, &entries)
        };
        found.map(|p| absolutize(&p, &self.base_dir))
    }

    /// Probe once: locate, query the version, check the minimum.
    pub fn probe(&self) -> Result<RuntimeDescriptor> {
        let missing = |reason: MissingReason| SetupError::EnvironmentMissing {
            runtime: self.executable.clone(),
            reason,
        };

        let executable = self.locate().ok_or_else(|| missing(MissingReason::NotFound))?;
        tracing::debug!("Resolved '{}' to {}", self.executable, executable.display());

        let spec = CommandSpec::new(&executable).arg("--version");
        let result = match self.runner.run(&spec) {
            Ok(result) => result,
            Err(e) if is_not_found(&e) => return Err(missing(MissingReason::NotFound)),
            Err(e) => {
                return Err(missing(MissingReason::VersionQueryFailed {
                    detail: e.to_string(),
                }))
            }
        };

        if !result.success {
            return Err(missing(MissingReason::VersionQueryFailed {
                detail: match result.exit_code {
                    Some(code) => format!("exited with code {}", code),
                    None => "terminated by signal".to_string(),
                },
            }));
        }

        // Python 2 and some 3.x builds print the banner on stderr
        let output = result.combined_output();
        let version = Version::extract(&output)
            .ok_or_else(|| missing(MissingReason::Unparsable { output }))?;

        if !version.satisfies(&self.minimum) {
            return Err(missing(MissingReason::BelowMinimum {
                found: version,
                minimum: self.minimum,
            }));
        }

        tracing::info!("Found runtime {} at {}", version, executable.display());
        Ok(RuntimeDescriptor {
            executable,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockResponse, MockRunner};
    use std::fs;
    use tempfile::TempDir;

    /// Create a fake binary at a path (creates parent dirs as needed).
    fn create_fake_binary(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    fn python_name() -> &'static str {
        if cfg!(windows) {
            "python.exe"
        } else {
            "python3"
        }
    }

    fn fake_env(version_output: MockResponse) -> (TempDir, MockRunner) {
        let temp = TempDir::new().unwrap();
        create_fake_binary(&temp.path().join("bin").join(python_name()));
        let runner = MockRunner::new();
        runner.on(python_name(), version_output);
        (temp, runner)
    }

    fn prober<'a>(runner: &'a MockRunner, temp: &TempDir, min: Version) -> RuntimeProber<'a> {
        let exe = if cfg!(windows) { "python" } else { "python3" };
        RuntimeProber::new(runner, exe, min)
            .with_search_path(vec![temp.path().join("bin")])
            .with_base_dir(temp.path())
    }

    #[test]
    fn resolve_tool_path_finds_first_match() {
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        create_fake_binary(&dir_a.join(python_name()));
        create_fake_binary(&dir_b.join(python_name()));

        let tool = if cfg!(windows) { "python" } else { "python3" };
        let result = resolve_tool_path(tool, &[dir_a.clone(), dir_b.clone()]);
        assert_eq!(result, Some(dir_a.join(python_name())));
    }

    #[test]
    fn resolve_tool_path_returns_none_when_not_found() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("empty");
        fs::create_dir_all(&dir).unwrap();

        assert!(resolve_tool_path("python3", &[dir]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_tool_path_skips_non_executable() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let dir_a = temp.path().join("a");
        let dir_b = temp.path().join("b");
        fs::create_dir_all(&dir_a).unwrap();
        fs::write(dir_a.join("python3"), "not executable").unwrap();
        fs::set_permissions(dir_a.join("python3"), fs::Permissions::from_mode(0o644)).unwrap();
        create_fake_binary(&dir_b.join("python3"));

        let result = resolve_tool_path("python3", &[dir_a, dir_b.clone()]);
        assert_eq!(result, Some(dir_b.join("python3")));
    }

    #[test]
    fn is_executable_returns_false_for_nonexistent_file() {
        assert!(!is_executable(Path::new("/nonexistent/path/to/file")));
    }

    #[test]
    fn probe_returns_descriptor() {
        let (temp, runner) = fake_env(MockResponse::ok("Python 3.10.4\n"));
        let runtime = prober(&runner, &temp, Version::new(3, 8, 0)).probe().unwrap();

        assert_eq!(runtime.version, Version::new(3, 10, 4));
        assert!(runtime.executable.is_absolute());
        assert_eq!(runtime.executable, temp.path().join("bin").join(python_name()));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec!["--version"]);
    }

    #[test]
    fn probe_reads_version_from_stderr() {
        let (temp, runner) = fake_env(MockResponse {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: "Python 3.9.2\n".to_string(),
        });
        let runtime = prober(&runner, &temp, Version::new(3, 8, 0)).probe().unwrap();
        assert_eq!(runtime.version, Version::new(3, 9, 2));
    }

    #[test]
    fn probe_missing_executable_is_not_found() {
        let temp = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let err = prober(&runner, &temp, Version::new(3, 8, 0))
            .probe()
            .unwrap_err();

        assert!(matches!(
            err,
            SetupError::EnvironmentMissing {
                reason: MissingReason::NotFound,
                ..
            }
        ));
        // nothing was run
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn probe_equal_to_minimum_passes() {
        let (temp, runner) = fake_env(MockResponse::ok("Python 3.8.0"));
        assert!(prober(&runner, &temp, Version::new(3, 8, 0)).probe().is_ok());
    }

    #[test]
    fn probe_one_patch_below_minimum_fails() {
        let (temp, runner) = fake_env(MockResponse::ok("Python 3.8.0"));
        let err = prober(&runner, &temp, Version::new(3, 8, 1))
            .probe()
            .unwrap_err();

        match err {
            SetupError::EnvironmentMissing {
                reason: MissingReason::BelowMinimum { found, minimum },
                ..
            } => {
                assert_eq!(found, Version::new(3, 8, 0));
                assert_eq!(minimum, Version::new(3, 8, 1));
            }
            other => panic!("Expected BelowMinimum, got {:?}", other),
        }
    }

    #[test]
    fn probe_unparsable_output() {
        let (temp, runner) = fake_env(MockResponse::ok("hello world"));
        let err = prober(&runner, &temp, Version::new(3, 8, 0))
            .probe()
            .unwrap_err();
        assert!(matches!(
            err,
            SetupError::EnvironmentMissing {
                reason: MissingReason::Unparsable { .. },
                ..
            }
        ));
    }

    #[test]
    fn probe_failed_version_query() {
        let (temp, runner) = fake_env(MockResponse::fail(9, "boom"));
        let err = prober(&runner, &temp, Version::new(3, 8, 0))
            .probe()
            .unwrap_err();
        match err {
            SetupError::EnvironmentMissing {
                reason: MissingReason::VersionQueryFailed { detail },
                ..
            } => assert!(detail.contains('9')),
            other => panic!("Expected VersionQueryFailed, got {:?}", other),
        }
    }

    #[test]
    fn probe_runs_exactly_once_on_failure() {
        let (temp, runner) = fake_env(MockResponse::fail(1, ""));
        let _ = prober(&runner, &temp, Version::new(3, 8, 0)).probe();
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn explicit_path_skips_path_search() {
        let temp = TempDir::new().unwrap();
        let custom = temp.path().join("venv").join("bin").join(python_name());
        create_fake_binary(&custom);

        let runner = MockRunner::new();
        runner.on(python_name(), MockResponse::ok("Python 3.11.1"));

        let runtime = RuntimeProber::new(&runner, &custom.to_string_lossy(), Version::new(3, 8, 0))
            .with_search_path(vec![])
            .probe()
            .unwrap();
        assert_eq!(runtime.executable, custom);
    }

    #[test]
    fn relative_path_entries_become_absolute() {
        let temp = TempDir::new().unwrap();
        create_fake_binary(&temp.path().join("rel").join(python_name()));
        let runner = MockRunner::new();

        let tool = if cfg!(windows) { "python" } else { "python3" };
        let found = RuntimeProber::new(&runner, tool, Version::new(3, 8, 0))
            .with_search_path(vec![PathBuf::from("rel")])
            .with_base_dir(temp.path())
            .locate()
            .unwrap();
        assert!(found.is_absolute());
        assert_eq!(found, temp.path().join("rel").join(python_name()));
    }

    #[test]
    fn missing_reason_hints_are_actionable() {
        assert!(MissingReason::NotFound.hint().contains("PATH"));
        let below = MissingReason::BelowMinimum {
            found: Version::new(3, 6, 0),
            minimum: Version::new(3, 8, 0),
        };
        assert!(below.hint().contains("3.8.0"));
    }
}

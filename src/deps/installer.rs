//! Dependency installation through the runtime's package manager.
//!
//! The installer runs pip exactly once with the whole package list and
//! relies on pip to skip what is already satisfied. A failed install is
//! reported as a [`DependencyInstallWarning`], never as an error: the
//! tracking job can still run (and fail loudly) with whatever made it in,
//! and the next setup run will try again.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::error::{Result, SetupError};
use crate::runtime::RuntimeDescriptor;
use crate::shell::{CommandRunner, CommandSpec};

/// Flags that keep pip quiet and stop it from ever waiting on input.
pub const PIP_QUIET_FLAGS: &[&str] = &["--quiet", "--disable-pip-version-check", "--no-input"];

/// Ordered set of package names to install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySpec {
    packages: Vec<String>,
}

impl DependencySpec {
    /// Build a spec, rejecting blank and duplicate names.
    ///
    /// Names are compared the way pip compares them: case-insensitively,
    /// with runs of `-`, `_` and `.` treated as equal.
    pub fn new<I, S>(packages: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut list = Vec::new();

        for pkg in packages {
            let pkg: String = pkg.into();
            let pkg = pkg.trim().to_string();
            if pkg.is_empty() {
                return Err(SetupError::ConfigValidationError {
                    message: "Dependency names must not be empty".to_string(),
                });
            }
            if !seen.insert(normalize_name(&pkg)) {
                return Err(SetupError::ConfigValidationError {
                    message: format!("Dependency '{}' is listed more than once", pkg),
                });
            }
            list.push(pkg);
        }

        Ok(Self { packages: list })
    }

    /// Package names in configured order.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Whether there is nothing to install.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Normalized project name for duplicate detection.
///
/// Strips any version specifier or extras (`pandas>=2`, `yfinance[nospam]`)
/// before normalizing.
pub fn normalize_name(name: &str) -> String {
    let bare = name
        .split(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | '[' | ';' | ' ' | '@'))
        .next()
        .unwrap_or(name);

    let mut out = String::with_capacity(bare.len());
    let mut last_sep = false;
    for c in bare.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_sep {
                out.push('-');
            }
            last_sep = true;
        } else {
            out.extend(c.to_lowercase());
            last_sep = false;
        }
    }
    out
}

/// Outcome of one installer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Whether the package manager exited 0 (or there was nothing to do).
    pub succeeded: bool,
    /// Raw exit code; `None` when the process never ran or died by signal.
    pub exit_code: Option<i32>,
    /// Rendered command line, empty when skipped.
    pub command: String,
    /// Wall-clock time spent.
    pub duration: Duration,
    /// Spawn failure message, when pip could not start at all.
    pub spawn_error: Option<String>,
}

impl InstallReport {
    /// Report for an empty dependency list.
    pub fn skipped() -> Self {
        Self {
            succeeded: true,
            exit_code: None,
            command: String::new(),
            duration: Duration::ZERO,
            spawn_error: None,
        }
    }

    /// The non-fatal warning this report represents, if any.
    pub fn warning(&self) -> Option<DependencyInstallWarning> {
        if self.succeeded {
            None
        } else {
            Some(DependencyInstallWarning {
                command: self.command.clone(),
                exit_code: self.exit_code,
                spawn_error: self.spawn_error.clone(),
            })
        }
    }
}

/// A failed dependency install. Logged and shown, never fatal.
///
/// Network outages and resolution failures are not told apart; both
/// surface as a non-zero pip exit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct DependencyInstallWarning {
    pub command: String,
    pub exit_code: Option<i32>,
    pub spawn_error: Option<String>,
}

impl fmt::Display for DependencyInstallWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.spawn_error, self.exit_code) {
            (Some(err), _) => write!(f, "dependency install could not start: {}", err),
            (None, Some(code)) => write!(f, "dependency install exited with code {}", code),
            (None, None) => write!(f, "dependency install was terminated"),
        }
    }
}

/// Runs the package manager for a probed runtime.
pub struct DependencyInstaller<'a> {
    runner: &'a dyn CommandRunner,
    extra_args: Vec<String>,
}

impl<'a> DependencyInstaller<'a> {
    /// Create an installer.
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            extra_args: Vec::new(),
        }
    }

    /// Extra arguments placed before the package names (e.g. `--user`).
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// The single command that installs `deps` into `runtime`.
    pub fn command(&self, deps: &DependencySpec, runtime: &RuntimeDescriptor) -> CommandSpec {
        CommandSpec::new(&runtime.executable)
            .args(["-m", "pip", "install"])
            .args(PIP_QUIET_FLAGS.iter().copied())
            .args(self.extra_args.iter().cloned())
            .args(deps.packages().iter().cloned())
    }

    /// Install everything in one invocation. Never fails the pipeline.
    pub fn ensure(&self, deps: &DependencySpec, runtime: &RuntimeDescriptor) -> InstallReport {
        if deps.is_empty() {
            tracing::debug!("No dependencies configured; skipping install");
            return InstallReport::skipped();
        }

        let spec = self.command(deps, runtime);
        let command = spec.display();
        let start = Instant::now();

        let report = match self.runner.run(&spec) {
            Ok(result) => InstallReport {
                succeeded: result.success,
                exit_code: result.exit_code,
                command,
                duration: result.duration,
                spawn_error: None,
            },
            Err(e) => InstallReport {
                succeeded: false,
                exit_code: None,
                command,
                duration: start.elapsed(),
                spawn_error: Some(e.to_string()),
            },
        };

        match report.warning() {
            Some(warning) => tracing::warn!("{}", warning),
            None => tracing::info!(
                "Installed {} package(s) in {:?}",
                deps.packages().len(),
                report.duration
            ),
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Version;
    use crate::shell::{MockResponse, MockRunner};
    use std::path::PathBuf;

    fn runtime() -> RuntimeDescriptor {
        RuntimeDescriptor {
            executable: PathBuf::from("/usr/bin/python3"),
            version: Version::new(3, 10, 4),
        }
    }

    fn default_deps() -> DependencySpec {
        DependencySpec::new(["yfinance", "pandas", "matplotlib"]).unwrap()
    }

    #[test]
    fn spec_rejects_duplicates_after_normalizing() {
        let err = DependencySpec::new(["Pandas", "pandas"]).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        assert!(DependencySpec::new(["typing_extensions", "typing-extensions"]).is_err());
        assert!(DependencySpec::new(["zope.interface", "zope-interface"]).is_err());
    }

    #[test]
    fn spec_rejects_blank_names() {
        assert!(DependencySpec::new(["pandas", "  "]).is_err());
    }

    #[test]
    fn spec_preserves_order() {
        let spec = default_deps();
        assert_eq!(spec.packages(), &["yfinance", "pandas", "matplotlib"]);
    }

    #[test]
    fn normalize_strips_specifiers_and_extras() {
        assert_eq!(normalize_name("pandas>=2.0"), "pandas");
        assert_eq!(normalize_name("yfinance[nospam]"), "yfinance");
        assert_eq!(normalize_name("Foo__Bar"), "foo-bar");
    }

    #[test]
    fn ensure_runs_pip_once_with_all_packages() {
        let runner = MockRunner::new();
        runner.on("python3", MockResponse::ok(""));

        let report = DependencyInstaller::new(&runner).ensure(&default_deps(), &runtime());

        assert!(report.succeeded);
        assert_eq!(report.exit_code, Some(0));
        assert!(report.warning().is_none());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec![
                "-m",
                "pip",
                "install",
                "--quiet",
                "--disable-pip-version-check",
                "--no-input",
                "yfinance",
                "pandas",
                "matplotlib"
            ]
        );
    }

    #[test]
    fn extra_args_precede_packages() {
        let runner = MockRunner::new();
        runner.on("python3", MockResponse::ok(""));

        DependencyInstaller::new(&runner)
            .with_extra_args(vec!["--user".to_string()])
            .ensure(&default_deps(), &runtime());

        let args = &runner.calls()[0].args;
        let user = args.iter().position(|a| a == "--user").unwrap();
        let first_pkg = args.iter().position(|a| a == "yfinance").unwrap();
        assert!(user < first_pkg);
    }

    #[test]
    fn nonzero_exit_is_a_warning() {
        let runner = MockRunner::new();
        runner.on("python3", MockResponse::fail(1, "Could not find a version"));

        let report = DependencyInstaller::new(&runner).ensure(&default_deps(), &runtime());

        assert!(!report.succeeded);
        assert_eq!(report.exit_code, Some(1));
        let warning = report.warning().unwrap();
        assert!(warning.to_string().contains("code 1"));
        assert!(warning.command.contains("pip install"));
    }

    #[test]
    fn spawn_failure_is_a_warning() {
        let runner = MockRunner::new();

        let report = DependencyInstaller::new(&runner).ensure(&default_deps(), &runtime());

        assert!(!report.succeeded);
        assert!(report.spawn_error.is_some());
        assert!(report.warning().unwrap().to_string().contains("could not start"));
    }

    #[test]
    fn empty_spec_skips_invocation() {
        let runner = MockRunner::new();
        let report =
            DependencyInstaller::new(&runner).ensure(&DependencySpec::default(), &runtime());

        assert!(report.succeeded);
        assert!(runner.calls().is_empty());
    }
}

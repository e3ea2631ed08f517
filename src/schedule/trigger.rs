//! The trigger descriptor handed to a scheduler backend.

use std::path::{Path, PathBuf};

use super::recurrence::Recurrence;
use super::RegistrationError;

/// Everything a backend needs to install one periodic job.
///
/// All paths are resolved at setup time. The scheduler runs the job
/// detached from any shell, so nothing here may depend on the setup
/// process's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTriggerDescriptor {
    /// Stable unique key in the scheduler.
    pub name: String,
    /// Absolute path of the interpreter.
    pub program: PathBuf,
    /// Absolute path of the tracking script.
    pub entry_point: PathBuf,
    /// Absolute directory the job runs in.
    pub working_dir: PathBuf,
    pub recurrence: Recurrence,
    pub enabled: bool,
    /// Where stdout and stderr are appended, if anywhere.
    pub log_file: Option<PathBuf>,
}

/// Whether `name` is usable as a trigger key on every backend.
pub fn is_valid_trigger_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Quote for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

impl ScheduledTriggerDescriptor {
    /// An enabled trigger with no log redirection.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        entry_point: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            entry_point: entry_point.into(),
            working_dir: working_dir.into(),
            recurrence,
            enabled: true,
            log_file: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    fn paths(&self) -> Vec<(&'static str, &Path)> {
        let mut paths = vec![
            ("runtime", self.program.as_path()),
            ("entry point", self.entry_point.as_path()),
            ("working directory", self.working_dir.as_path()),
        ];
        if let Some(log) = &self.log_file {
            paths.push(("log file", log.as_path()));
        }
        paths
    }

    /// Whether any path contains `c`.
    pub(crate) fn paths_contain(&self, c: char) -> bool {
        self.paths()
            .iter()
            .any(|(_, p)| p.to_string_lossy().contains(c))
    }

    /// Check the handoff contract: a stable name and absolute, existing,
    /// single-line paths.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if !is_valid_trigger_name(&self.name) {
            return Err(RegistrationError::MalformedCommand {
                message: format!(
                    "trigger name '{}' may only contain letters, digits, '.', '_' and '-'",
                    self.name
                ),
            });
        }

        for (what, path) in self.paths() {
            let text = path.to_string_lossy();
            if !path.is_absolute() {
                return Err(RegistrationError::MalformedCommand {
                    message: format!("{} path '{}' is not absolute", what, text),
                });
            }
            if text.contains(['\n', '\r', '\0']) {
                return Err(RegistrationError::MalformedCommand {
                    message: format!("{} path contains a line break", what),
                });
            }
        }

        if !self.entry_point.is_file() {
            return Err(RegistrationError::MalformedCommand {
                message: format!(
                    "entry point '{}' does not exist",
                    self.entry_point.display()
                ),
            });
        }
        if !self.working_dir.is_dir() {
            return Err(RegistrationError::MalformedCommand {
                message: format!(
                    "working directory '{}' does not exist",
                    self.working_dir.display()
                ),
            });
        }

        Ok(())
    }

    /// Command line for `sh -c`, as cron runs it.
    ///
    /// ```
    /// use tracker_setup::schedule::{Recurrence, ScheduledTriggerDescriptor};
    ///
    /// let trigger = ScheduledTriggerDescriptor::new(
    ///     "hk-stock-tracker",
    ///     "/usr/bin/python3",
    ///     "/srv/tracker/auto_stock_tracker.py",
    ///     "/srv/tracker",
    ///     Recurrence::daily(9, 0).unwrap(),
    /// );
    /// assert_eq!(
    ///     trigger.posix_command(),
    ///     "cd '/srv/tracker' && '/usr/bin/python3' '/srv/tracker/auto_stock_tracker.py'"
    /// );
    /// ```
    pub fn posix_command(&self) -> String {
        let mut cmd = format!(
            "cd {} && {} {}",
            shell_quote(&self.working_dir.to_string_lossy()),
            shell_quote(&self.program.to_string_lossy()),
            shell_quote(&self.entry_point.to_string_lossy()),
        );
        if let Some(log) = &self.log_file {
            cmd.push_str(&format!(" >> {} 2>&1", shell_quote(&log.to_string_lossy())));
        }
        cmd
    }

    /// Command line for the Task Scheduler `/TR` argument.
    pub fn windows_command(&self) -> String {
        format!("cmd {}", self.windows_arguments())
    }

    /// The arguments handed to `cmd` by [`Self::windows_command`].
    pub fn windows_arguments(&self) -> String {
        let quote = |p: &Path| format!("\"{}\"", p.display());
        let mut cmd = format!(
            "/c cd /d {} && {} {}",
            quote(&self.working_dir),
            quote(&self.program),
            quote(&self.entry_point),
        );
        if let Some(log) = &self.log_file {
            cmd.push_str(&format!(" >> {} 2>&1", quote(log)));
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ScheduledTriggerDescriptor) {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("auto_stock_tracker.py");
        fs::write(&entry, "print('tick')\n").unwrap();
        let trigger = ScheduledTriggerDescriptor::new(
            "hk-stock-tracker",
            temp.path().join("bin").join("python3"),
            entry,
            temp.path(),
            Recurrence::daily(9, 0).unwrap(),
        );
        (temp, trigger)
    }

    #[test]
    fn valid_names() {
        assert!(is_valid_trigger_name("hk-stock-tracker"));
        assert!(is_valid_trigger_name("tracker_v2.daily"));
        assert!(!is_valid_trigger_name(""));
        assert!(!is_valid_trigger_name("hk stock"));
        assert!(!is_valid_trigger_name("a/b"));
    }

    #[test]
    fn validate_accepts_absolute_existing_paths() {
        let (_temp, trigger) = fixture();
        assert!(trigger.validate().is_ok());
    }

    #[test]
    fn validate_rejects_relative_entry_point() {
        let (_temp, mut trigger) = fixture();
        trigger.entry_point = PathBuf::from("auto_stock_tracker.py");
        let err = trigger.validate().unwrap_err();
        assert!(matches!(err, RegistrationError::MalformedCommand { .. }));
        assert!(err.to_string().contains("not absolute"));
    }

    #[test]
    fn validate_rejects_missing_entry_point() {
        let (temp, mut trigger) = fixture();
        trigger.entry_point = temp.path().join("gone.py");
        assert!(trigger.validate().unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn validate_rejects_relative_log_file() {
        let (_temp, trigger) = fixture();
        let trigger = trigger.with_log_file(Some(PathBuf::from("tracker.log")));
        assert!(trigger.validate().is_err());
    }

    #[test]
    fn posix_command_quotes_every_path() {
        let (temp, trigger) = fixture();
        let cmd = trigger.posix_command();
        assert!(cmd.starts_with(&format!("cd '{}'", temp.path().display())));
        assert!(cmd.contains("auto_stock_tracker.py'"));
        assert!(!cmd.contains(">>"));
    }

    #[test]
    fn posix_command_appends_log_redirect() {
        let (temp, trigger) = fixture();
        let log = temp.path().join("tracker.log");
        let cmd = trigger.with_log_file(Some(log.clone())).posix_command();
        assert!(cmd.ends_with(&format!(">> '{}' 2>&1", log.display())));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/srv/it's"), r"'/srv/it'\''s'");
    }

    #[test]
    fn windows_command_uses_double_quotes() {
        let trigger = ScheduledTriggerDescriptor::new(
            "hk-stock-tracker",
            r"C:\Python312\python.exe",
            r"C:\tracker\auto_stock_tracker.py",
            r"C:\tracker",
            Recurrence::daily(9, 0).unwrap(),
        );
        assert_eq!(
            trigger.windows_command(),
            r#"cmd /c cd /d "C:\tracker" && "C:\Python312\python.exe" "C:\tracker\auto_stock_tracker.py""#
        );
    }
}

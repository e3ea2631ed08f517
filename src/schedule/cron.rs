//! User crontab backend.
//!
//! Each managed entry is a two-line block: a marker comment naming the
//! trigger and carrying its portable schedule, then the cron line itself
//! (commented out when the trigger is disabled).
//!
//! ```text
//! # tracker-setup: name=hk-stock-tracker schedule=daily@09:00
//! 0 9 * * * cd '/srv/tracker' && '/usr/bin/python3' '/srv/tracker/auto_stock_tracker.py'
//! ```
//!
//! An upsert reads the whole table, drops every block with the same name,
//! appends the new block and installs the result with a single
//! `crontab -` call. Lines the tool did not write are left untouched.

use crate::shell::{is_not_found, CommandRunner, CommandSpec};

use super::recurrence::Recurrence;
use super::trigger::ScheduledTriggerDescriptor;
use super::{InstalledTrigger, RegistrationError, SchedulerBackend};

/// Prefix of every marker comment.
pub const MARKER_PREFIX: &str = "# tracker-setup:";

const CRONTAB: &str = "crontab";

/// Scheduler backed by the invoking user's crontab.
pub struct CronScheduler<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> CronScheduler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Current table text. A user with no crontab yet has an empty one.
    fn read_table(&self) -> Result<String, RegistrationError> {
        let spec = CommandSpec::new(CRONTAB).arg("-l");
        let result = self.runner.run(&spec).map_err(|e| unavailable(&e))?;

        if result.success {
            return Ok(result.stdout);
        }
        if result.stderr.to_lowercase().contains("no crontab for") {
            return Ok(String::new());
        }
        Err(classify(&result.stderr, "crontab -l failed"))
    }

    fn write_table(&self, table: &str) -> Result<(), RegistrationError> {
        tracing::debug!("Installing crontab ({} lines)", table.lines().count());
        let spec = CommandSpec::new(CRONTAB).arg("-").stdin(table);
        let result = self.runner.run(&spec).map_err(|e| unavailable(&e))?;

        if result.success {
            Ok(())
        } else {
            Err(classify(&result.stderr, "crontab - failed"))
        }
    }
}

fn unavailable(err: &crate::error::SetupError) -> RegistrationError {
    let message = if is_not_found(err) {
        "crontab is not installed".to_string()
    } else {
        err.to_string()
    };
    RegistrationError::SchedulerUnavailable { message }
}

/// Sort a crontab failure into privilege vs. availability.
fn classify(stderr: &str, fallback: &str) -> RegistrationError {
    let message = if stderr.trim().is_empty() {
        fallback.to_string()
    } else {
        stderr.trim().to_string()
    };
    let lower = message.to_lowercase();
    if lower.contains("not allowed")
        || lower.contains("permission denied")
        || lower.contains("operation not permitted")
    {
        RegistrationError::PrivilegeDenied { message }
    } else {
        RegistrationError::SchedulerUnavailable { message }
    }
}

/// Name and schedule text from a marker line.
fn parse_marker(line: &str) -> Option<(&str, Option<&str>)> {
    let rest = line.trim().strip_prefix(MARKER_PREFIX)?;
    let mut name = None;
    let mut schedule = None;
    for field in rest.split_whitespace() {
        if let Some(v) = field.strip_prefix("name=") {
            name = Some(v);
        } else if let Some(v) = field.strip_prefix("schedule=") {
            schedule = Some(v);
        }
    }
    Some((name?, schedule))
}

fn marker_line(trigger: &ScheduledTriggerDescriptor) -> String {
    format!(
        "{} name={} schedule={}",
        MARKER_PREFIX, trigger.name, trigger.recurrence
    )
}

/// Cron treats a bare `%` in the command field as a newline.
fn escape_percent(command: &str) -> String {
    command.replace('%', r"\%")
}

fn entry_line(trigger: &ScheduledTriggerDescriptor) -> String {
    let line = format!(
        "{} {}",
        trigger.recurrence.to_cron(),
        escape_percent(&trigger.posix_command())
    );
    if trigger.enabled {
        line
    } else {
        format!("# {}", line)
    }
}

/// Drop every managed block named `name`. Returns the remaining lines and
/// whether anything was dropped.
fn strip_blocks(table: &str, name: &str) -> (Vec<String>, bool) {
    let mut kept = Vec::new();
    let mut removed = false;
    let mut lines = table.lines().peekable();

    while let Some(line) = lines.next() {
        match parse_marker(line) {
            Some((marker_name, _)) if marker_name == name => {
                removed = true;
                // A line that is not one of our entries stays with the user
                if lines.peek().is_some_and(|next| managed_entry(next).is_some()) {
                    lines.next();
                }
            }
            _ => kept.push(line.to_string()),
        }
    }

    (kept, removed)
}

fn render(lines: &[String]) -> String {
    let mut table = lines.join("\n");
    if !table.is_empty() {
        table.push('\n');
    }
    table
}

/// Split a cron line into its schedule fields and its command.
fn split_entry(line: &str) -> Option<(String, String)> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(5);
    for _ in 0..5 {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields.join(" "), rest.replace(r"\%", "%")))
}

/// Enabled flag, schedule fields and command of an entry this tool wrote.
///
/// Disabled entries are commented out; every written command starts with
/// a `cd` into the working directory.
fn managed_entry(line: &str) -> Option<(bool, String, String)> {
    let line = line.trim_start();
    if parse_marker(line).is_some() {
        return None;
    }
    let (enabled, body) = match line.strip_prefix('#') {
        Some(body) => (false, body.trim_start()),
        None => (true, line),
    };
    let (fields, command) = split_entry(body)?;
    command
        .starts_with("cd ")
        .then_some((enabled, fields, command))
}

impl SchedulerBackend for CronScheduler<'_> {
    fn name(&self) -> &'static str {
        "cron"
    }

    fn upsert(&mut self, trigger: &ScheduledTriggerDescriptor) -> Result<(), RegistrationError> {
        let current = self.read_table()?;
        let (mut lines, replaced) = strip_blocks(&current, &trigger.name);

        lines.push(marker_line(trigger));
        lines.push(entry_line(trigger));
        let updated = render(&lines);

        if updated == current {
            tracing::debug!("Crontab already up to date for '{}'", trigger.name);
            return Ok(());
        }

        self.write_table(&updated)?;
        tracing::info!(
            "{} crontab entry '{}'",
            if replaced { "Replaced" } else { "Added" },
            trigger.name
        );
        Ok(())
    }

    fn query(&self, name: &str) -> Result<Option<InstalledTrigger>, RegistrationError> {
        let table = self.read_table()?;
        let mut lines = table.lines().peekable();
        let mut found = None;

        // Last block wins if a hand edit left several
        while let Some(line) = lines.next() {
            let Some((marker_name, schedule)) = parse_marker(line) else {
                continue;
            };
            if marker_name != name {
                continue;
            }
            let Some((enabled, cron_expr, command)) = lines.peek().and_then(|next| managed_entry(next))
            else {
                continue;
            };

            found = Some(InstalledTrigger {
                name: name.to_string(),
                command,
                schedule: cron_expr,
                recurrence: schedule.and_then(|s| s.parse::<Recurrence>().ok()),
                enabled,
            });
        }

        Ok(found)
    }

    fn remove(&mut self, name: &str) -> Result<bool, RegistrationError> {
        let current = self.read_table()?;
        let (lines, removed) = strip_blocks(&current, name);
        if removed {
            self.write_table(&render(&lines))?;
            tracing::info!("Removed crontab entry '{}'", name);
        }
        Ok(removed)
    }
}

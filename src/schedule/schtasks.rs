//! Windows Task Scheduler backend, driven through `schtasks.exe`.
//!
//! `/Create /F` replaces an existing task of the same name in one call,
//! which gives the upsert its atomicity. A disabled trigger is created
//! from a task definition file so the enabled flag lands in that same
//! call.

use std::collections::HashMap;
use std::io::Write;

use quick_xml::escape::escape;
use tempfile::NamedTempFile;

use crate::shell::{is_not_found, CommandResult, CommandRunner, CommandSpec};

use super::recurrence::{weekday_name, Interval, Recurrence};
use super::trigger::ScheduledTriggerDescriptor;
use super::{InstalledTrigger, RegistrationError, SchedulerBackend};

/// Longest command `schtasks /TR` accepts.
pub const MAX_TASK_COMMAND: usize = 261;

const SCHTASKS: &str = "schtasks";

/// Scheduler backed by the Windows Task Scheduler.
pub struct SchtasksScheduler<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SchtasksScheduler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn run(&self, args: Vec<String>) -> Result<CommandResult, RegistrationError> {
        let spec = CommandSpec::new(SCHTASKS).args(args);
        self.runner.run(&spec).map_err(|e| RegistrationError::SchedulerUnavailable {
            message: if is_not_found(&e) {
                "schtasks.exe is not available".to_string()
            } else {
                e.to_string()
            },
        })
    }
}

fn classify(output: &str) -> RegistrationError {
    let message = output.trim().to_string();
    if message.to_lowercase().contains("access is denied") {
        RegistrationError::PrivilegeDenied { message }
    } else {
        RegistrationError::SchedulerUnavailable { message }
    }
}

fn is_missing_task(output: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains("cannot find") || lower.contains("does not exist")
}

fn calendar_trigger(recurrence: &Recurrence) -> String {
    let start = recurrence
        .times_of_day()
        .first()
        .copied()
        .unwrap_or(recurrence.anchor());
    let boundary = format!(
        "<StartBoundary>2000-01-01T{}</StartBoundary>",
        start.format("%H:%M:%S")
    );
    let by_day = "<ScheduleByDay><DaysInterval>1</DaysInterval></ScheduleByDay>";

    match recurrence.interval() {
        Interval::Daily => format!("{}{}", boundary, by_day),
        Interval::EveryHours(n) => format!(
            "<Repetition><Interval>PT{}H</Interval><Duration>P1D</Duration></Repetition>{}{}",
            n, boundary, by_day
        ),
        Interval::Weekly(day) => format!(
            "{}<ScheduleByWeek><DaysOfWeek><{} /></DaysOfWeek><WeeksInterval>1</WeeksInterval></ScheduleByWeek>",
            boundary,
            weekday_name(day)
        ),
    }
}

/// Task Scheduler XML definition for `trigger`.
pub fn task_xml(trigger: &ScheduledTriggerDescriptor) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-16"?>
<Task version="1.2" xmlns="http://schemas.microsoft.com/windows/2004/02/mit/task">
  <Triggers>
    <CalendarTrigger>{}</CalendarTrigger>
  </Triggers>
  <Settings>
    <Enabled>{}</Enabled>
    <MultipleInstancesPolicy>IgnoreNew</MultipleInstancesPolicy>
    <DisallowStartIfOnBatteries>false</DisallowStartIfOnBatteries>
    <StopIfGoingOnBatteries>false</StopIfGoingOnBatteries>
  </Settings>
  <Actions Context="Author">
    <Exec>
      <Command>cmd</Command>
      <Arguments>{}</Arguments>
    </Exec>
  </Actions>
</Task>
"#,
        calendar_trigger(&trigger.recurrence),
        trigger.enabled,
        escape(trigger.windows_arguments().as_str()),
    )
}

/// Write `xml` as UTF-16LE with a byte order mark, the encoding schtasks reads.
fn write_definition(xml: &str) -> Result<NamedTempFile, RegistrationError> {
    let unavailable = |e: std::io::Error| RegistrationError::SchedulerUnavailable {
        message: format!("could not write task definition: {}", e),
    };
    let mut file = tempfile::Builder::new()
        .prefix("tracker-setup-")
        .suffix(".xml")
        .tempfile()
        .map_err(unavailable)?;

    let mut bytes = vec![0xFF, 0xFE];
    bytes.extend(xml.encode_utf16().flat_map(u16::to_le_bytes));
    file.write_all(&bytes).map_err(unavailable)?;
    Ok(file)
}

/// Parse `schtasks /Query /FO LIST /V` output into key/value pairs.
fn parse_list(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

impl SchedulerBackend for SchtasksScheduler<'_> {
    fn name(&self) -> &'static str {
        "schtasks"
    }

    fn upsert(&mut self, trigger: &ScheduledTriggerDescriptor) -> Result<(), RegistrationError> {
        let command = trigger.windows_command();
        if command.len() > MAX_TASK_COMMAND {
            return Err(RegistrationError::MalformedCommand {
                message: format!(
                    "command is {} characters, Task Scheduler allows {}",
                    command.len(),
                    MAX_TASK_COMMAND
                ),
            });
        }
        if trigger.paths_contain('"') {
            return Err(RegistrationError::MalformedCommand {
                message: "paths may not contain double quotes".to_string(),
            });
        }

        let mut args: Vec<String> = vec![
            "/Create".into(),
            "/F".into(),
            "/TN".into(),
            trigger.name.clone(),
        ];

        // Held until schtasks has read it
        let mut definition = None;
        if trigger.enabled {
            args.push("/TR".into());
            args.push(command);
            args.extend(trigger.recurrence.to_schtasks_args());
        } else {
            let file = write_definition(&task_xml(trigger))?;
            args.push("/XML".into());
            args.push(file.path().display().to_string());
            definition = Some(file);
        }

        let result = self.run(args)?;
        drop(definition);
        if !result.success {
            return Err(classify(&result.combined_output()));
        }

        tracing::info!("Registered scheduled task '{}'", trigger.name);
        Ok(())
    }

    fn query(&self, name: &str) -> Result<Option<InstalledTrigger>, RegistrationError> {
        let result = self.run(vec![
            "/Query".into(),
            "/TN".into(),
            name.to_string(),
            "/FO".into(),
            "LIST".into(),
            "/V".into(),
        ])?;

        if !result.success {
            let output = result.combined_output();
            return if is_missing_task(&output) {
                Ok(None)
            } else {
                Err(classify(&output))
            };
        }

        let fields = parse_list(&result.stdout);
        let field = |key: &str| fields.get(key).cloned().unwrap_or_default();

        let schedule = [field("Schedule Type"), field("Start Time")]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" at ");

        Ok(Some(InstalledTrigger {
            name: name.to_string(),
            command: field("Task To Run"),
            schedule,
            recurrence: None,
            enabled: !field("Scheduled Task State").eq_ignore_ascii_case("disabled"),
        }))
    }

    fn remove(&mut self, name: &str) -> Result<bool, RegistrationError> {
        let result = self.run(vec![
            "/Delete".into(),
            "/F".into(),
            "/TN".into(),
            name.to_string(),
        ])?;

        if result.success {
            tracing::info!("Removed scheduled task '{}'", name);
            return Ok(true);
        }
        let output = result.combined_output();
        if is_missing_task(&output) {
            Ok(false)
        } else {
            Err(classify(&output))
        }
    }
}

//! Trigger registration on top of a scheduler backend.

use chrono::{DateTime, Local};

use crate::error::{Result, SetupError};

use super::trigger::ScheduledTriggerDescriptor;
use super::{RegistrationResult, SchedulerBackend};

/// Validates triggers and hands them to a backend.
pub struct TriggerRegistrar<'a> {
    backend: &'a mut dyn SchedulerBackend,
}

impl<'a> TriggerRegistrar<'a> {
    pub fn new(backend: &'a mut dyn SchedulerBackend) -> Self {
        Self { backend }
    }

    /// Backend name.
    pub fn backend(&self) -> &'static str {
        self.backend.name()
    }

    /// Create or replace `trigger`, then compute its next fire time after `now`.
    ///
    /// Nothing reaches the scheduler unless the descriptor validates.
    pub fn register(
        &mut self,
        trigger: &ScheduledTriggerDescriptor,
        now: DateTime<Local>,
    ) -> Result<RegistrationResult> {
        let result = self.preview(trigger, now)?;
        self.backend
            .upsert(trigger)
            .map_err(|cause| SetupError::TriggerRegistrationFailed {
                trigger: trigger.name.clone(),
                cause,
            })?;

        tracing::info!(
            "Trigger '{}' registered with {} ({})",
            trigger.name,
            self.backend.name(),
            trigger.recurrence
        );
        Ok(result)
    }

    /// Validate and compute the result `register` would return, without
    /// touching the scheduler.
    pub fn preview(
        &self,
        trigger: &ScheduledTriggerDescriptor,
        now: DateTime<Local>,
    ) -> Result<RegistrationResult> {
        trigger
            .validate()
            .map_err(|cause| SetupError::TriggerRegistrationFailed {
                trigger: trigger.name.clone(),
                cause,
            })?;

        let next_fire = if trigger.enabled {
            trigger.recurrence.next_after(&now)
        } else {
            None
        };

        Ok(RegistrationResult {
            trigger_name: trigger.name.clone(),
            next_fire,
            backend: self.backend.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{InMemoryScheduler, Recurrence, RegistrationError};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ScheduledTriggerDescriptor) {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("auto_stock_tracker.py");
        fs::write(&entry, "").unwrap();
        let trigger = ScheduledTriggerDescriptor::new(
            "hk-stock-tracker",
            "/usr/bin/python3",
            entry,
            temp.path(),
            Recurrence::daily(9, 0).unwrap(),
        );
        (temp, trigger)
    }

    fn jan15(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn register_reports_next_fire() {
        let (_temp, trigger) = fixture();
        let mut scheduler = InMemoryScheduler::new();
        let result = TriggerRegistrar::new(&mut scheduler)
            .register(&trigger, jan15(8))
            .unwrap();

        assert_eq!(result.trigger_name, "hk-stock-tracker");
        assert_eq!(result.next_fire, Some(jan15(9)));
        assert_eq!(result.backend, "memory");
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn disabled_trigger_has_no_next_fire() {
        let (_temp, trigger) = fixture();
        let mut scheduler = InMemoryScheduler::new();
        let result = TriggerRegistrar::new(&mut scheduler)
            .register(&trigger.with_enabled(false), jan15(8))
            .unwrap();
        assert_eq!(result.next_fire, None);
    }

    #[test]
    fn invalid_trigger_never_reaches_backend() {
        let (temp, mut trigger) = fixture();
        trigger.entry_point = temp.path().join("missing.py");
        let mut scheduler = InMemoryScheduler::new();

        let err = TriggerRegistrar::new(&mut scheduler)
            .register(&trigger, jan15(8))
            .unwrap_err();

        assert!(matches!(
            err,
            SetupError::TriggerRegistrationFailed {
                cause: RegistrationError::MalformedCommand { .. },
                ..
            }
        ));
        assert_eq!(scheduler.upsert_count(), 0);
    }

    #[test]
    fn backend_failure_keeps_cause() {
        let (_temp, trigger) = fixture();
        let mut scheduler = InMemoryScheduler::new().fail_with(RegistrationError::PrivilegeDenied {
            message: "not allowed".into(),
        });

        let err = TriggerRegistrar::new(&mut scheduler)
            .register(&trigger, jan15(8))
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_REGISTRATION_FAILED);
        assert!(err.hint().unwrap().contains("administrator"));
    }

    #[test]
    fn preview_does_not_upsert() {
        let (_temp, trigger) = fixture();
        let mut scheduler = InMemoryScheduler::new();
        let result = TriggerRegistrar::new(&mut scheduler)
            .preview(&trigger, jan15(10))
            .unwrap();

        assert_eq!(result.next_fire, Some(jan15(9) + chrono::Duration::days(1)));
        assert!(scheduler.is_empty());
    }
}

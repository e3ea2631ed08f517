//! In-process scheduler.
//!
//! Holds triggers in a map keyed by name, so an upsert is a plain insert
//! and duplicates cannot exist. Used by the pipeline tests and anywhere
//! the host scheduler must not be touched.

use std::collections::BTreeMap;

use super::trigger::ScheduledTriggerDescriptor;
use super::{InstalledTrigger, RegistrationError, SchedulerBackend};

/// Scheduler that keeps triggers in memory.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    triggers: BTreeMap<String, ScheduledTriggerDescriptor>,
    upserts: usize,
    fail_with: Option<RegistrationError>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later upsert and removal fail with `err`.
    pub fn fail_with(mut self, err: RegistrationError) -> Self {
        self.fail_with = Some(err);
        self
    }

    /// Stored descriptor for `name`.
    pub fn get(&self, name: &str) -> Option<&ScheduledTriggerDescriptor> {
        self.triggers.get(name)
    }

    /// Number of stored triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Names of all stored triggers.
    pub fn names(&self) -> Vec<String> {
        self.triggers.keys().cloned().collect()
    }

    /// How many upserts were accepted.
    pub fn upsert_count(&self) -> usize {
        self.upserts
    }
}

impl SchedulerBackend for InMemoryScheduler {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn upsert(&mut self, trigger: &ScheduledTriggerDescriptor) -> Result<(), RegistrationError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.triggers.insert(trigger.name.clone(), trigger.clone());
        self.upserts += 1;
        Ok(())
    }

    fn query(&self, name: &str) -> Result<Option<InstalledTrigger>, RegistrationError> {
        Ok(self.triggers.get(name).map(|t| InstalledTrigger {
            name: t.name.clone(),
            command: t.posix_command(),
            schedule: t.recurrence.to_string(),
            recurrence: Some(t.recurrence),
            enabled: t.enabled,
        }))
    }

    fn remove(&mut self, name: &str) -> Result<bool, RegistrationError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.triggers.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(entry: &str, schedule: &str) -> ScheduledTriggerDescriptor {
        ScheduledTriggerDescriptor::new(
            "hk-stock-tracker",
            "/usr/bin/python3",
            entry,
            "/srv/tracker",
            schedule.parse().unwrap(),
        )
    }

    #[test]
    fn upsert_replaces_every_field() {
        let mut scheduler = InMemoryScheduler::new();
        scheduler
            .upsert(&trigger("/srv/tracker/old.py", "daily@08:00").with_log_file(Some(
                "/tmp/old.log".into(),
            )))
            .unwrap();
        let newer = trigger("/srv/tracker/new.py", "6h@00:30");
        scheduler.upsert(&newer).unwrap();

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.get("hk-stock-tracker"), Some(&newer));
        assert_eq!(scheduler.upsert_count(), 2);
    }

    #[test]
    fn query_reports_portable_schedule() {
        let mut scheduler = InMemoryScheduler::new();
        scheduler
            .upsert(&trigger("/srv/tracker/a.py", "daily@09:00"))
            .unwrap();
        let installed = scheduler.query("hk-stock-tracker").unwrap().unwrap();
        assert_eq!(installed.schedule, "daily@09:00");
        assert!(installed.enabled);
    }

    #[test]
    fn fail_with_rejects_upserts() {
        let mut scheduler = InMemoryScheduler::new().fail_with(
            RegistrationError::SchedulerUnavailable {
                message: "down".into(),
            },
        );
        assert!(scheduler
            .upsert(&trigger("/srv/tracker/a.py", "daily@09:00"))
            .is_err());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn remove_reports_whether_present() {
        let mut scheduler = InMemoryScheduler::new();
        scheduler
            .upsert(&trigger("/srv/tracker/a.py", "daily@09:00"))
            .unwrap();
        assert!(scheduler.remove("hk-stock-tracker").unwrap());
        assert!(!scheduler.remove("hk-stock-tracker").unwrap());
    }
}

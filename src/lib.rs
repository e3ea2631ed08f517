//! tracker-setup - Bootstrap for a scheduled Hong Kong stock tracker.
//!
//! One idempotent run takes a machine from "has the tracking script" to
//! "runs the tracking script on a schedule": it checks for a usable
//! Python, installs the script's libraries in one package manager call,
//! and creates or replaces a named trigger in the host scheduler.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`deps`] - Dependency installation through pip
//! - [`error`] - Error types, exit codes and result aliases
//! - [`pipeline`] - The probe, install, register sequence
//! - [`runtime`] - Interpreter discovery and version gating
//! - [`schedule`] - Recurrence rules and scheduler backends
//! - [`shell`] - Process spawning behind an injectable runner
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use tracker_setup::schedule::Recurrence;
//! use chrono::{Local, TimeZone};
//!
//! let rule: Recurrence = "daily@09:00".parse().unwrap();
//! let now = Local.with_ymd_and_hms(2026, 1, 15, 8, 0, 0).unwrap();
//! let next = rule.next_after(&now).unwrap();
//! assert_eq!(next, Local.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap());
//! assert_eq!(rule.to_cron(), "0 9 * * *");
//! ```

pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod schedule;
pub mod shell;
pub mod ui;

pub use error::{Result, SetupError};

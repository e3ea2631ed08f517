//! Backend-independent recurrence rules.
//!
//! A [`Recurrence`] is an interval plus an anchor time of day. It has a
//! portable textual form used in configuration and in crontab markers:
//!
//! | Form               | Meaning                                   |
//! |--------------------|-------------------------------------------|
//! | `daily@09:00`      | every day at 09:00                        |
//! | `6h@00:30`         | every 6 hours, at 00:30, 06:30, ...       |
//! | `weekly:mon@09:00` | every Monday at 09:00                     |
//!
//! Each scheduler backend renders the rule into its own native syntax.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// How often a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Once a day.
    Daily,
    /// Every `n` hours, where `n` divides 24.
    EveryHours(u32),
    /// Once a week on the given day.
    Weekly(Weekday),
}

/// An interval anchored at a time of day.
///
/// Built through [`Recurrence::new`] or parsing, so an hour interval
/// always divides 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Recurrence {
    interval: Interval,
    anchor: NaiveTime,
}

impl Default for Recurrence {
    /// Every day at 09:00.
    fn default() -> Self {
        Self {
            interval: Interval::Daily,
            anchor: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl Recurrence {
    /// A rule firing on `interval` from `anchor`.
    ///
    /// Returns `None` for an hour interval that does not divide 24.
    pub fn new(interval: Interval, anchor: NaiveTime) -> Option<Self> {
        let interval = match interval {
            Interval::EveryHours(n) => hours_interval(n).ok()?,
            other => other,
        };
        Some(Self { interval, anchor })
    }

    /// Every day at `hour:minute`.
    pub fn daily(hour: u32, minute: u32) -> Option<Self> {
        Self::new(Interval::Daily, NaiveTime::from_hms_opt(hour, minute, 0)?)
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn anchor(&self) -> NaiveTime {
        self.anchor
    }

    /// Times of day this rule fires, in ascending order.
    pub fn times_of_day(&self) -> Vec<NaiveTime> {
        match self.interval {
            Interval::Daily | Interval::Weekly(_) => vec![self.anchor],
            Interval::EveryHours(n) => {
                let mut hours: Vec<u32> = (0..24 / n)
                    .map(|k| (self.anchor.hour() + k * n) % 24)
                    .collect();
                hours.sort_unstable();
                hours
                    .into_iter()
                    .filter_map(|h| NaiveTime::from_hms_opt(h, self.anchor.minute(), 0))
                    .collect()
            }
        }
    }

    fn fires_on(&self, date: NaiveDate) -> bool {
        match self.interval {
            Interval::Weekly(day) => date.weekday() == day,
            _ => true,
        }
    }

    /// First firing instant strictly after `now`, in `now`'s time zone.
    ///
    /// Local times that do not exist (spring-forward gaps) are skipped;
    /// ambiguous ones (fall-back) resolve to the earlier instant.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let start = now.date_naive();

        // Two weeks covers a weekly rule even when one occurrence falls in a gap
        for offset in 0..=14 {
            let date = start + Duration::days(offset);
            if !self.fires_on(date) {
                continue;
            }
            for time in self.times_of_day() {
                let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).earliest()
                else {
                    continue;
                };
                if candidate > *now {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Five-field crontab expression.
    pub fn to_cron(&self) -> String {
        let minute = self.anchor.minute();
        match self.interval {
            Interval::Daily => format!("{} {} * * *", minute, self.anchor.hour()),
            Interval::EveryHours(_) => {
                let hours: Vec<String> = self
                    .times_of_day()
                    .iter()
                    .map(|t| t.hour().to_string())
                    .collect();
                format!("{} {} * * *", minute, hours.join(","))
            }
            Interval::Weekly(day) => format!(
                "{} {} * * {}",
                minute,
                self.anchor.hour(),
                day.num_days_from_sunday()
            ),
        }
    }

    /// `schtasks /Create` schedule arguments.
    pub fn to_schtasks_args(&self) -> Vec<String> {
        // Hourly tasks start at the earliest slot of the day
        let start = self.times_of_day().first().copied().unwrap_or(self.anchor);
        let mut args: Vec<String> = match self.interval {
            Interval::Daily => vec!["/SC".into(), "DAILY".into()],
            Interval::EveryHours(n) => vec![
                "/SC".into(),
                "HOURLY".into(),
                "/MO".into(),
                n.to_string(),
            ],
            Interval::Weekly(day) => vec![
                "/SC".into(),
                "WEEKLY".into(),
                "/D".into(),
                weekday_token(day).to_uppercase(),
            ],
        };
        args.push("/ST".into());
        args.push(start.format("%H:%M").to_string());
        args
    }

    /// Human phrasing for status lines.
    pub fn describe(&self) -> String {
        let at = self.anchor.format("%H:%M");
        match self.interval {
            Interval::Daily => format!("every day at {}", at),
            Interval::EveryHours(n) => format!("every {} hours from {}", n, at),
            Interval::Weekly(day) => format!("every {} at {}", weekday_name(day), at),
        }
    }
}

fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

pub(super) fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.anchor.format("%H:%M");
        match self.interval {
            Interval::Daily => write!(f, "daily@{}", at),
            Interval::EveryHours(n) => write!(f, "{}h@{}", n, at),
            Interval::Weekly(day) => write!(f, "weekly:{}@{}", weekday_token(day), at),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (interval, anchor) = s.split_once('@').ok_or_else(|| {
            format!(
                "invalid schedule '{}': expected <interval>@HH:MM, e.g. daily@09:00",
                s
            )
        })?;

        let anchor = NaiveTime::parse_from_str(anchor.trim(), "%H:%M")
            .map_err(|_| format!("invalid schedule '{}': anchor must be HH:MM", s))?;

        let interval = parse_interval(&interval.trim().to_lowercase())
            .map_err(|reason| format!("invalid schedule '{}': {}", s, reason))?;

        Ok(Self { interval, anchor })
    }
}

fn parse_interval(text: &str) -> Result<Interval, String> {
    if text == "daily" {
        return Ok(Interval::Daily);
    }
    if text == "hourly" {
        return Ok(Interval::EveryHours(1));
    }
    if let Some(day) = text.strip_prefix("weekly:") {
        return day
            .parse::<Weekday>()
            .map(Interval::Weekly)
            .map_err(|_| format!("unknown weekday '{}'", day));
    }
    if let Some(hours) = text.strip_suffix('h') {
        let n: u32 = hours
            .parse()
            .map_err(|_| format!("unknown interval '{}'", text))?;
        return hours_interval(n);
    }
    Err(format!(
        "unknown interval '{}' (use daily, <N>h or weekly:<day>)",
        text
    ))
}

fn hours_interval(n: u32) -> Result<Interval, String> {
    if n == 0 || 24 % n != 0 {
        return Err(format!("hour interval must divide 24, got {}", n));
    }
    Ok(if n == 24 {
        Interval::Daily
    } else {
        Interval::EveryHours(n)
    })
}

impl TryFrom<String> for Recurrence {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Recurrence> for String {
    fn from(value: Recurrence) -> Self {
        value.to_string()
    }
}

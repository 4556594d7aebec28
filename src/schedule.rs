//! Tutoring-hours schedule.
//!
//! The chat engine defers to in-person tutoring while a configured
//! day-of-week/time-of-day window is open. Windows are evaluated in the
//! campus time zone, inclusive at both boundary minutes.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// A single tutoring window as minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First open minute (e.g. 10:30 -> 630).
    pub start: u32,
    /// Last open minute, inclusive (e.g. 12:30 -> 750).
    pub end: u32,
}

impl Window {
    /// Parse a window from `"HH:MM"` boundary strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        let start = parse_minute_of_day(start)?;
        let end = parse_minute_of_day(end)?;
        if start > end {
            return Err(ScheduleError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Whether the given minute-of-day falls inside this window.
    /// Both boundaries count as open.
    #[must_use]
    pub fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.start && minute_of_day <= self.end
    }
}

fn parse_minute_of_day(s: &str) -> Result<u32, ScheduleError> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| ScheduleError::BadTime(s.to_string()))?;
    let h: u32 = h.parse().map_err(|_| ScheduleError::BadTime(s.to_string()))?;
    let m: u32 = m.parse().map_err(|_| ScheduleError::BadTime(s.to_string()))?;
    if h > 23 || m > 59 {
        return Err(ScheduleError::BadTime(s.to_string()));
    }
    Ok(h * 60 + m)
}

fn format_minute_of_day(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Errors raised while building a schedule from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A boundary string was not `HH:MM`.
    #[error("invalid time of day: {0} (expected HH:MM)")]
    BadTime(String),

    /// The window ends before it starts.
    #[error("window ends before it starts ({start} > {end})")]
    InvertedWindow { start: u32, end: u32 },

    /// The weekday name was not recognized.
    #[error("invalid weekday: {0}")]
    BadWeekday(String),

    /// The IANA time zone name was not recognized.
    #[error("invalid time zone: {0}")]
    BadTimezone(String),
}

/// Weekly tutoring-hours schedule in a fixed time zone.
#[derive(Debug, Clone)]
pub struct TutoringSchedule {
    tz: Tz,
    windows: HashMap<Weekday, Vec<Window>>,
}

impl TutoringSchedule {
    /// Create an empty schedule in the given zone.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            windows: HashMap::new(),
        }
    }

    /// The default campus schedule: weekday sessions in Eastern Time.
    #[must_use]
    pub fn campus_default() -> Self {
        Self::campus_default_in(chrono_tz::America::New_York)
    }

    /// The default weekday windows evaluated in a different zone.
    #[must_use]
    pub fn campus_default_in(tz: Tz) -> Self {
        let mut schedule = Self::new(tz);
        schedule.add_window(Weekday::Mon, Window { start: 630, end: 750 }); // 10:30 - 12:30
        schedule.add_window(Weekday::Tue, Window { start: 1020, end: 1140 }); // 17:00 - 19:00
        schedule.add_window(Weekday::Wed, Window { start: 720, end: 840 }); // 12:00 - 14:00
        schedule.add_window(Weekday::Thu, Window { start: 630, end: 750 }); // 10:30 - 12:30
        schedule.add_window(Weekday::Fri, Window { start: 780, end: 900 }); // 13:00 - 15:00
        schedule
    }

    /// Add a window to a weekday.
    pub fn add_window(&mut self, day: Weekday, window: Window) {
        self.windows.entry(day).or_default().push(window);
    }

    /// The schedule's time zone.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Whether any tutoring window is open at the given instant.
    #[must_use]
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.tz);
        let minute = local.hour() * 60 + local.minute();
        self.windows
            .get(&local.weekday())
            .is_some_and(|windows| windows.iter().any(|w| w.contains(minute)))
    }

    /// Whether any tutoring window is open right now.
    #[must_use]
    pub fn is_open_now(&self) -> bool {
        self.is_open_at(Utc::now())
    }

    /// Human-readable window listing for refusal messages,
    /// e.g. `"Mon 10:30-12:30, Tue 17:00-19:00"`.
    #[must_use]
    pub fn describe(&self) -> String {
        const ORDER: [Weekday; 7] = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];

        let mut parts = Vec::new();
        for day in ORDER {
            if let Some(windows) = self.windows.get(&day) {
                for w in windows {
                    parts.push(format!(
                        "{day} {}-{}",
                        format_minute_of_day(w.start),
                        format_minute_of_day(w.end)
                    ));
                }
            }
        }
        parts.join(", ")
    }
}

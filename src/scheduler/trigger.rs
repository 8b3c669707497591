// src/scheduler/trigger.rs
//! When a job fires next. All arithmetic is in UTC and purely
//! functional: given "now", each trigger yields the first instant
//! strictly after it, or `None` for a trigger that can never fire.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use itertools::Itertools;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Fixed period between firings, anchored to the previous one.
    Interval { every: Duration },
    /// Once a day at a fixed time.
    Daily { hour: u32, minute: u32 },
    /// Restricted calendar window: a set of weekdays, an inclusive hour
    /// range, and a minute step within each hour (`*/step`).
    Cron {
        days: Vec<Weekday>,
        hour_start: u32,
        hour_end: u32,
        minute_step: u32,
    },
}

impl Trigger {
    pub fn every_secs(secs: u64) -> Self {
        Trigger::Interval {
            every: Duration::from_secs(secs),
        }
    }

    pub fn every_minutes(minutes: u64) -> Self {
        Self::every_secs(minutes * 60)
    }

    pub fn every_hours(hours: u64) -> Self {
        Self::every_secs(hours * 3600)
    }

    pub fn daily_at(hour: u32, minute: u32) -> Self {
        Trigger::Daily { hour, minute }
    }

    pub fn cron(days: Vec<Weekday>, hour_start: u32, hour_end: u32, minute_step: u32) -> Self {
        Trigger::Cron {
            days,
            hour_start,
            hour_end,
            minute_step,
        }
    }

    /// First firing instant strictly after `after`, or `None` when the
    /// trigger cannot fire (zero interval, empty day set, out-of-range
    /// time components).
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Interval { every } => {
                let step = ChronoDuration::from_std(*every).ok()?;
                if step <= ChronoDuration::zero() {
                    return None;
                }
                Some(after + step)
            }
            Trigger::Daily { hour, minute } => {
                let time = NaiveTime::from_hms_opt(*hour, *minute, 0)?;
                let today = Utc.from_utc_datetime(&after.date_naive().and_time(time));
                if today > after {
                    Some(today)
                } else {
                    let next_day = after.date_naive().succ_opt()?.and_time(time);
                    Some(Utc.from_utc_datetime(&next_day))
                }
            }
            Trigger::Cron {
                days,
                hour_start,
                hour_end,
                minute_step,
            } => {
                if days.is_empty() || *minute_step == 0 || hour_start > hour_end || *hour_end > 23 {
                    return None;
                }
                // Walk forward minute by minute; the window repeats
                // weekly, so eight days bounds the scan.
                let start = (after + ChronoDuration::minutes(1))
                    .naive_utc()
                    .with_second(0)?
                    .with_nanosecond(0)?;
                let mut candidate = Utc.from_utc_datetime(&start);
                for _ in 0..(8 * 24 * 60) {
                    if days.contains(&candidate.weekday())
                        && candidate.hour() >= *hour_start
                        && candidate.hour() <= *hour_end
                        && candidate.minute() % *minute_step == 0
                    {
                        return Some(candidate);
                    }
                    candidate += ChronoDuration::minutes(1);
                }
                None
            }
        }
    }

    /// Short human-readable form for job listings and logs.
    pub fn describe(&self) -> String {
        match self {
            Trigger::Interval { every } => {
                let secs = every.as_secs();
                if secs > 0 && secs % 3600 == 0 {
                    format!("every {}h", secs / 3600)
                } else if secs > 0 && secs % 60 == 0 {
                    format!("every {}m", secs / 60)
                } else {
                    format!("every {}s", secs)
                }
            }
            Trigger::Daily { hour, minute } => format!("daily at {:02}:{:02}", hour, minute),
            Trigger::Cron {
                days,
                hour_start,
                hour_end,
                minute_step,
            } => {
                let days = days.iter().map(|d| d.to_string().to_lowercase()).join(",");
                format!(
                    "{} {:02}-{:02}h every {}m",
                    days, hour_start, hour_end, minute_step
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn weekdays() -> Vec<Weekday> {
        vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
    }

    #[test]
    fn interval_fires_one_period_later() {
        let trigger = Trigger::every_minutes(30);
        // 2026-01-12 is a Monday.
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 10, 0, 0)),
            Some(at(2026, 1, 12, 10, 30, 0))
        );
    }

    #[test]
    fn zero_interval_never_fires() {
        assert_eq!(Trigger::every_secs(0).next_after(at(2026, 1, 12, 10, 0, 0)), None);
    }

    #[test]
    fn daily_fires_later_today_when_still_ahead() {
        let trigger = Trigger::daily_at(10, 0);
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 9, 30, 0)),
            Some(at(2026, 1, 12, 10, 0, 0))
        );
    }

    #[test]
    fn daily_rolls_to_tomorrow_at_the_exact_instant() {
        let trigger = Trigger::daily_at(10, 0);
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 10, 0, 0)),
            Some(at(2026, 1, 13, 10, 0, 0))
        );
    }

    #[test]
    fn daily_with_invalid_time_never_fires() {
        assert_eq!(Trigger::daily_at(25, 0).next_after(at(2026, 1, 12, 9, 0, 0)), None);
    }

    #[test]
    fn cron_advances_to_next_step_within_the_window() {
        let trigger = Trigger::cron(weekdays(), 9, 18, 15);
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 10, 7, 0)),
            Some(at(2026, 1, 12, 10, 15, 0))
        );
    }

    #[test]
    fn cron_waits_for_the_window_to_open() {
        let trigger = Trigger::cron(weekdays(), 9, 18, 15);
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 8, 30, 0)),
            Some(at(2026, 1, 12, 9, 0, 0))
        );
    }

    #[test]
    fn cron_skips_the_weekend() {
        let trigger = Trigger::cron(weekdays(), 9, 18, 15);
        // Friday evening, past the window: next firing is Monday 09:00.
        assert_eq!(
            trigger.next_after(at(2026, 1, 9, 18, 50, 0)),
            Some(at(2026, 1, 12, 9, 0, 0))
        );
    }

    #[test]
    fn cron_end_hour_is_inclusive() {
        let trigger = Trigger::cron(weekdays(), 9, 18, 15);
        assert_eq!(
            trigger.next_after(at(2026, 1, 12, 18, 20, 0)),
            Some(at(2026, 1, 12, 18, 30, 0))
        );
    }

    #[test]
    fn cron_with_no_days_or_zero_step_never_fires() {
        let now = at(2026, 1, 12, 10, 0, 0);
        assert_eq!(Trigger::cron(vec![], 9, 18, 15).next_after(now), None);
        assert_eq!(Trigger::cron(weekdays(), 9, 18, 0).next_after(now), None);
        assert_eq!(Trigger::cron(weekdays(), 18, 9, 15).next_after(now), None);
    }

    #[test]
    fn describe_is_compact() {
        assert_eq!(Trigger::every_minutes(30).describe(), "every 30m");
        assert_eq!(Trigger::every_hours(1).describe(), "every 1h");
        assert_eq!(Trigger::daily_at(10, 0).describe(), "daily at 10:00");
        let cron = Trigger::cron(vec![Weekday::Mon, Weekday::Fri], 9, 18, 15);
        assert_eq!(cron.describe(), "mon,fri 09-18h every 15m");
    }
}

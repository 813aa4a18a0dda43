//! Hand-ported 5-field cron parser and advance function. No cron-expression
//! crate appears anywhere in the retrieval pack, so rather than introduce one
//! for a narrowly-scoped need, this mirrors the original's own parser
//! (`original_source/src/workers/base.py::parse_cron_schedule`,
//! `parse_cron_field`): each of the five fields is either `"*"` (any) or a
//! single literal integer — the original's supported grammar, no ranges or
//! lists. `next()` scans minute-by-minute, matching spec.md §9(e)'s "cron
//! advance logic" note.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Option<u32>,
    hour: Option<u32>,
    day: Option<u32>,
    month: Option<u32>,
    weekday: Option<u32>,
}

/// Upper bound on how far `next()` will scan before giving up — a schedule
/// that never matches (e.g. day=31 in a month without one) would otherwise
/// spin forever.
const MAX_SCAN_MINUTES: i64 = 60 * 24 * 366 * 2;

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(format!(
                "invalid cron schedule string: expected 5 fields, got {}",
                fields.len()
            ));
        }

        Ok(CronSchedule {
            minute: parse_field(fields[0])?,
            hour: parse_field(fields[1])?,
            day: parse_field(fields[2])?,
            month: parse_field(fields[3])?,
            weekday: parse_field(fields[4])?,
        })
    }

    fn matches(&self, at: DateTime<Utc>) -> bool {
        self.minute.map_or(true, |m| m == at.minute())
            && self.hour.map_or(true, |h| h == at.hour())
            && self.day.map_or(true, |d| d == at.day())
            && self.month.map_or(true, |mo| mo == at.month())
            && self
                .weekday
                .map_or(true, |wd| wd == at.weekday().num_days_from_sunday())
    }

    /// `next(now)`: the next minute-aligned instant strictly after `from`
    /// that satisfies every field, scanning forward one minute at a time.
    pub fn next(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        let start = from
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(from)
            + Duration::minutes(1);

        let mut candidate = start;
        for _ in 0..MAX_SCAN_MINUTES {
            if self.matches(candidate) {
                return candidate;
            }
            candidate += Duration::minutes(1);
        }
        candidate
    }
}

fn parse_field(field: &str) -> Result<Option<u32>, String> {
    if field == "*" {
        Ok(None)
    } else {
        field
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("invalid cron field: {field}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_minute_advances_by_one() {
        let schedule = CronSchedule::parse("* * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 10, 30, 0).unwrap();
        let next = schedule.next(now);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 7, 26, 10, 31, 0).unwrap());
    }

    #[test]
    fn next_is_always_at_or_after_now() {
        let schedule = CronSchedule::parse("0 3 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 10, 30, 45).unwrap();
        let next = schedule.next(now);
        assert!(next > now);
        assert_eq!(next.hour(), 3);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn rejects_malformed_expression() {
        assert!(CronSchedule::parse("* * *").is_err());
        assert!(CronSchedule::parse("a * * * *").is_err());
    }
}

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::last_day_of_month;
use crate::error::{Error, Result};
use crate::model::Task;

static RE_HALF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-H([12])$").unwrap());
static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());
static RE_ROLLING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})[dD]$").unwrap());

/// A span of calendar days used to scope which tasks are summarized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Half(i32, u8),
    Quarter(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    /// The last N days ending on (and including) the given date.
    Rolling(u32, NaiveDate),
}

impl Period {
    /// Parse a period string. `today` anchors the rolling form.
    ///
    /// Supported formats:
    /// - `2025` — year
    /// - `2025-H1` — half
    /// - `2025-Q1` — quarter
    /// - `2025-01` — month
    /// - `2025-W05` — ISO week
    /// - `30d` — rolling last N days
    pub fn parse(s: &str, today: NaiveDate) -> Result<Self> {
        let s = s.trim();

        let period = if let Some(caps) = RE_ROLLING.captures(s) {
            let n: u32 = number(&caps[1], s)?;
            if n == 0 {
                return Err(Error::PeriodParse(format!("empty rolling period: {s}")));
            }
            Period::Rolling(n, today)
        } else if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
            Period::Year(number(s, s)?)
        } else if let Some(caps) = RE_HALF.captures(s) {
            Period::Half(number(&caps[1], s)?, number(&caps[2], s)?)
        } else if let Some(caps) = RE_QUARTER.captures(s) {
            Period::Quarter(number(&caps[1], s)?, number(&caps[2], s)?)
        } else if let Some(caps) = RE_WEEK.captures(s) {
            Period::Week(number(&caps[1], s)?, number(&caps[2], s)?)
        } else if let Some(caps) = RE_MONTH.captures(s) {
            Period::Month(number(&caps[1], s)?, number(&caps[2], s)?)
        } else {
            return Err(Error::PeriodParse(format!("unrecognized period: {s}")));
        };

        // rejects month 13, week 54 and the like
        period.date_range()?;
        Ok(period)
    }

    /// The month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        Period::Month(date.year(), date.month() as u8)
    }

    /// Convert to a canonical key string.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Half(y, h) => format!("{y}-H{h}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
        }
    }

    /// Get the date range (inclusive start, inclusive end) for this period.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate)> {
        let invalid = || Error::PeriodParse(format!("out of range: {}", self.to_key()));
        let ymd = |y: i32, m: u32, d: u32| NaiveDate::from_ymd_opt(y, m, d).ok_or_else(invalid);

        match self {
            Period::Year(y) => Ok((ymd(*y, 1, 1)?, ymd(*y, 12, 31)?)),
            Period::Half(y, 1) => Ok((ymd(*y, 1, 1)?, ymd(*y, 6, 30)?)),
            Period::Half(y, 2) => Ok((ymd(*y, 7, 1)?, ymd(*y, 12, 31)?)),
            Period::Half(..) => Err(invalid()),
            Period::Quarter(y, q) if (1..=4).contains(q) => {
                let start_month = (*q as u32 - 1) * 3 + 1;
                let end_month = *q as u32 * 3;
                let end = last_day_of_month(*y, end_month).ok_or_else(invalid)?;
                Ok((ymd(*y, start_month, 1)?, end))
            }
            Period::Quarter(..) => Err(invalid()),
            Period::Month(y, m) => {
                let start = ymd(*y, *m as u32, 1)?;
                let end = last_day_of_month(*y, *m as u32).ok_or_else(invalid)?;
                Ok((start, end))
            }
            Period::Week(y, w) => {
                let start = NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon)
                    .ok_or_else(invalid)?;
                Ok((start, start + Duration::days(6)))
            }
            Period::Rolling(n, as_of) if *n > 0 => {
                Ok((*as_of - Duration::days(*n as i64 - 1), *as_of))
            }
            Period::Rolling(..) => Err(invalid()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> Result<bool> {
        let (start, end) = self.date_range()?;
        Ok(start <= date && date <= end)
    }

    /// Tasks dated within this period.
    pub fn filter_tasks<'a>(&self, tasks: &'a [Task]) -> Result<Vec<&'a Task>> {
        let mut kept = Vec::new();
        for task in tasks {
            if self.contains(task.date)? {
                kept.push(task);
            }
        }
        Ok(kept)
    }
}

fn number<T: std::str::FromStr>(digits: &str, input: &str) -> Result<T> {
    digits
        .parse()
        .map_err(|_| Error::PeriodParse(format!("invalid number in period: {input}")))
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}

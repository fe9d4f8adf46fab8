use crate::error::{Result, SalesAttainmentError};
use crate::utils::{count_working_days, days_in_month, month_name};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month used as the goal/reporting period, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    first_day: NaiveDate,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| {
                SalesAttainmentError::InvalidPeriod(format!("{:04}-{:02}", year, month))
            })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn key(&self) -> String {
        self.to_string()
    }

    /// e.g. "Octubre 2026"
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            month_name(self.month()).unwrap_or_default(),
            self.year()
        )
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn days_in_period(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    pub fn last_day(&self) -> NaiveDate {
        self.date(self.days_in_period()).unwrap_or(self.first_day)
    }

    pub fn date(&self, day: u32) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year(), self.month(), day).ok_or_else(|| {
            SalesAttainmentError::InvalidDay {
                period: self.key(),
                day,
                days_in_period: self.days_in_period(),
            }
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Period {
    type Err = SalesAttainmentError;

    /// Accepts exactly `YYYY-MM`; anything else is a caller error.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SalesAttainmentError::InvalidPeriod(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let (year_part, month_part) = (&s[..4], &s[5..]);
        if !year_part.bytes().all(|b| b.is_ascii_digit())
            || !month_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year: i32 = year_part.parse().map_err(|_| invalid())?;
        let month: u32 = month_part.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Period::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Period {
    type Error = SalesAttainmentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// The slice of a period a dashboard reports on: from the first of the month up to a cutoff day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub period: Period,
    /// Elapsed days used for run-rate math (the cutoff day of month).
    pub day_of_period: u32,
    pub days_in_period: u32,
    /// True when `today` falls inside `period`.
    pub is_current: bool,
}

impl ReportingWindow {
    /// Current period defaults to today's day, any other period to its last day.
    /// A `day_override` must lie inside the period.
    pub fn new(period: Period, today: NaiveDate, day_override: Option<u32>) -> Result<Self> {
        let days_in_period = period.days_in_period();
        let is_current = period.contains(today);

        let day_of_period = match day_override {
            Some(day) if day == 0 || day > days_in_period => {
                return Err(SalesAttainmentError::InvalidDay {
                    period: period.key(),
                    day,
                    days_in_period,
                });
            }
            Some(day) => day,
            None if is_current => today.day(),
            None => days_in_period,
        };

        Ok(Self {
            period,
            day_of_period,
            days_in_period,
            is_current,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.period.first_day()
    }

    pub fn cutoff_date(&self) -> Result<NaiveDate> {
        self.period.date(self.day_of_period)
    }

    /// Monday–Saturday days from the cutoff day (inclusive) to month end; 0 for closed periods.
    pub fn remaining_working_days(&self) -> u32 {
        if !self.is_current {
            return 0;
        }
        count_working_days(
            self.period.year(),
            self.period.month(),
            self.day_of_period,
            self.days_in_period,
        )
    }
}

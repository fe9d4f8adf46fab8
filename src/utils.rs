use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Number of calendar days in `month` of `year`, or 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    last_day_of_month(year, month).map_or(0, |date| date.day())
}

/// Counts Monday–Saturday days between `from_day` and `to_day` (both inclusive) of a month.
/// Days outside the month are ignored.
pub fn count_working_days(year: i32, month: u32, from_day: u32, to_day: u32) -> u32 {
    if from_day == 0 || from_day > to_day {
        return 0;
    }

    (from_day..=to_day)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|date| date.weekday() != Weekday::Sun)
        .count() as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthOption {
    /// `YYYY-MM`
    pub key: String,
    /// e.g. "Marzo 2025"
    pub name: String,
}

/// The twelve selectable months of `year`, January first.
pub fn months_of_year(year: i32) -> Vec<MonthOption> {
    MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| MonthOption {
            key: format!("{:04}-{:02}", year, idx + 1),
            name: format!("{} {}", name, year),
        })
        .collect()
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get((month as usize).checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
        assert_eq!(days_in_month(2023, 13), 0);
        assert_eq!(days_in_month(2023, 0), 0);
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28)
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            last_day_of_month(2024, 12),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(last_day_of_month(2024, 0), None);
        assert_eq!(last_day_of_month(2024, 13), None);
    }

    #[test]
    fn test_count_working_days_skips_sundays_only() {
        // June 2025: the 1st is a Sunday, 30 days, Sundays on 1, 8, 15, 22, 29.
        assert_eq!(count_working_days(2025, 6, 1, 30), 25);
        // 28 (Sat), 29 (Sun), 30 (Mon)
        assert_eq!(count_working_days(2025, 6, 28, 30), 2);
        assert_eq!(count_working_days(2025, 6, 29, 29), 0);
    }

    #[test]
    fn test_count_working_days_degenerate_ranges() {
        assert_eq!(count_working_days(2025, 6, 0, 30), 0);
        assert_eq!(count_working_days(2025, 6, 20, 10), 0);
        // Days past month end are ignored.
        assert_eq!(count_working_days(2025, 2, 27, 31), 2);
    }

    #[test]
    fn test_months_of_year() {
        let months = months_of_year(2025);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].key, "2025-01");
        assert_eq!(months[0].name, "Enero 2025");
        assert_eq!(months[11].key, "2025-12");
        assert_eq!(months[11].name, "Diciembre 2025");
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(3), Some("Marzo"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Calendar granularity for time-bucketed analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Week,
    Month,
    Year,
}

/// A calendar-aligned grouping key derived from a transaction date.
///
/// Keys are derived on demand and never persisted. Week keys follow ISO-8601
/// (Monday-aligned, with the ISO week-year), so two dates share a week key
/// iff they fall between the same Monday boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Week { year, week } => write!(f, "{:04}-W{:02}", year, week),
            PeriodKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            PeriodKey::Year { year } => write!(f, "{:04}", year),
        }
    }
}

/// Maps a date to its period key at the given granularity.
///
/// Total and deterministic: every valid `NaiveDate` has exactly one key per
/// granularity, and equal dates always yield equal keys.
pub fn bucket(date: NaiveDate, granularity: Granularity) -> PeriodKey {
    match granularity {
        Granularity::Week => {
            let iso = date.iso_week();
            PeriodKey::Week {
                year: iso.year(),
                week: iso.week(),
            }
        }
        Granularity::Month => PeriodKey::Month {
            year: date.year(),
            month: date.month(),
        },
        Granularity::Year => PeriodKey::Year { year: date.year() },
    }
}

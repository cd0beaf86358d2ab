use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A calendar bucket used for aggregation: a whole year, or one month of a year.
///
/// A date belongs to exactly one month bucket. No timezone or partial-period logic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Window {
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<u32>,
}

impl Window {
    pub const fn yearly(year: i32) -> Self {
        Self { year, month: None }
    }

    /// The month is not range checked, a month outside 1-12 matches no dates.
    pub const fn monthly(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    /// The month bucket that `date` falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self::monthly(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }

    pub fn is_monthly(&self) -> bool {
        self.month.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && self.month.map_or(true, |m| date.month() == m)
    }

    /// The twelve month buckets of this window's year.
    pub fn months(&self) -> impl Iterator<Item = Window> {
        let year = self.year;
        (1..=12).map(move |month| Window::monthly(year, month))
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:04}-{:02}", self.year, month),
            None => write!(f, "{:04}", self.year),
        }
    }
}

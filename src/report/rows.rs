//! Typed rows for the reporting queries and their JSON payloads.

use serde::{Deserialize, Deserializer, Serialize};
use time::Month;

use crate::{Error, database_id::BookId};

/// The total spent on one group (a book or a category) in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyGroupTotal {
    month_number: u8,
    year_number: i32,
    group_name: String,
    total_expense: f64,
}

impl MonthlyGroupTotal {
    /// Create a monthly total.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidMonth] if `month_number` is not between 1 and 12.
    pub fn new(
        month_number: u8,
        year_number: i32,
        group_name: &str,
        total_expense: f64,
    ) -> Result<Self, Error> {
        Month::try_from(month_number).map_err(|_| Error::InvalidMonth(month_number))?;

        Ok(Self {
            month_number,
            year_number,
            group_name: group_name.to_owned(),
            total_expense,
        })
    }

    /// The month, 1 for January through 12 for December.
    pub fn month_number(&self) -> u8 {
        self.month_number
    }

    /// The month as a [Month].
    pub fn month(&self) -> Month {
        // The month number is checked in `new`.
        Month::try_from(self.month_number).unwrap_or(Month::January)
    }

    /// The calendar year.
    pub fn year_number(&self) -> i32 {
        self.year_number
    }

    /// The name of the book or category.
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// The amount spent.
    pub fn total_expense(&self) -> f64 {
        self.total_expense
    }
}

/// A monthly total as sent by the summary RPCs, before the month is checked.
#[derive(Debug, Deserialize)]
struct RawMonthlyGroupTotal {
    month_number: u8,
    year_number: i32,
    #[serde(alias = "book_name", alias = "category_name")]
    group_name: String,
    total_expense: f64,
}

impl TryFrom<RawMonthlyGroupTotal> for MonthlyGroupTotal {
    type Error = Error;

    fn try_from(raw: RawMonthlyGroupTotal) -> Result<Self, Self::Error> {
        MonthlyGroupTotal::new(
            raw.month_number,
            raw.year_number,
            &raw.group_name,
            raw.total_expense,
        )
    }
}

/// The spending in one active book over three reporting windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    /// The ID of the book.
    pub id: BookId,
    /// The name of the book.
    pub name: String,
    /// What the book is used for.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// The total of every expense in the book.
    pub all_time: f64,
    /// The total for the current month.
    pub this_month: f64,
    /// The total for the current year.
    pub this_year: f64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Parse the JSON rows of a monthly totals RPC.
///
/// Rows may name the group with `group_name`, `book_name` or `category_name`.
///
/// # Errors
///
/// Returns [Error::InvalidResponse] if `json` does not match the row schema
/// and [Error::InvalidMonth] if a row has a month outside 1-12.
pub fn parse_monthly_totals(json: &str) -> Result<Vec<MonthlyGroupTotal>, Error> {
    let rows: Vec<RawMonthlyGroupTotal> =
        serde_json::from_str(json).map_err(|error| Error::InvalidResponse(error.to_string()))?;

    rows.into_iter().map(MonthlyGroupTotal::try_from).collect()
}

/// Parse the JSON rows of the books summary RPC.
///
/// # Errors
///
/// Returns [Error::InvalidResponse] if `json` does not match the row schema.
pub fn parse_books_summary(json: &str) -> Result<Vec<BookSummary>, Error> {
    serde_json::from_str(json).map_err(|error| Error::InvalidResponse(error.to_string()))
}

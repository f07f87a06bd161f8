//! Cashbook is an expense tracker for households and individuals.
//!
//! Expenses are recorded in books (ledgers) against book-scoped categories
//! and user-scoped payment modes. On top of the SQLite store this library
//! provides the three reporting units the front ends are built from:
//!
//! - [compile_filter] turns an [ExpenseFilter] into query
//!   constraints plus pagination, and [PageMeta] describes the resulting page.
//! - [build_chart_series] reshapes monthly totals into stacked bar chart
//!   records with a stable colour legend and value-axis range.
//! - [resolve_duration] maps a [DurationTag] to concrete calendar dates.

#![warn(missing_docs)]

use time::Date;

mod book;
mod category;
mod config;
mod database_id;
mod db;
mod duration;
mod expense;
mod name;
mod pagination;
mod payment_mode;
mod report;
mod session;
mod timezone;
mod user;

pub use book::{Book, BookName, BookUpdate, NewBook, create_book, get_book, get_books, update_book};
pub use category::{
    Category, CategoryName, CategoryUpdate, create_category, get_categories, update_category,
};
pub use config::{CashbookConfig, ChartConfig};
pub use database_id::{BookId, CategoryId, DatabaseId, ExpenseId, PaymentModeId, UserId};
pub use db::initialize as initialize_db;
pub use duration::{
    CustomRangeBounds, DateRange, DurationConfig, DurationTag, IncompleteRangePolicy, local_today,
    resolve_duration, resolve_duration_today,
};
pub use expense::{
    AmountCondition, AmountQuery, CompiledFilter, Constraint, EXPENSE_SORT_ORDER, Expense,
    ExpenseFilter, ExpenseUpdate, ExpenseWithDetails, NewExpense, SortKey, compile_filter,
    create_expense, delete_expense, get_expense, list_expenses, top_expenses, total_expenses,
    update_expense,
};
pub use pagination::{PageMeta, PageRequest, Paginated, PaginationConfig};
pub use payment_mode::{
    PaymentMode, PaymentModeName, PaymentModeUpdate, create_payment_mode, get_payment_modes,
    update_payment_mode,
};
pub use report::{
    BookSummary, ChartLegend, ChartRecord, ChartSeries, LegendEntry, MonthlyGroupTotal, Palette,
    axis_range, books_summary, build_chart_series, build_legend, build_records,
    monthly_totals_by_book, monthly_totals_by_category, parse_books_summary,
    parse_monthly_totals, stacked_bar_chart,
};
pub use session::Session;
pub use timezone::get_local_offset;
pub use user::{NewUser, User, Username, get_user_by_username, register_user};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A page size below one was requested.
    ///
    /// Page sizes are never clamped, the caller must fix the request.
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(u64),

    /// A page number below one was requested. Pages are numbered from 1.
    #[error("page number must be at least 1, got {0}")]
    InvalidPage(u64),

    /// A date range where the start date comes after the end date.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        /// The first day of the range.
        start: Date,
        /// The last day of the range.
        end: Date,
    },

    /// A custom range was missing a bound and the configured policy rejects
    /// incomplete ranges.
    #[error("a custom range needs both a start and an end date")]
    IncompleteCustomRange,

    /// An expense amount that is zero, negative or not a number.
    #[error("{0} is not a valid expense amount, amounts must be greater than zero")]
    NonPositiveAmount(f64),

    /// An empty string was used for an expense remark.
    #[error("expense remark cannot be empty")]
    EmptyRemark,

    /// An empty string was used to create a book name.
    #[error("book name cannot be empty")]
    EmptyBookName,

    /// An empty string was used to create a category name.
    #[error("category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used to create a payment mode name.
    #[error("payment mode name cannot be empty")]
    EmptyPaymentModeName,

    /// An empty string was used to create a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// The username is already registered.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// A month number outside of 1-12 was found in a row.
    #[error("{0} is not a valid month number")]
    InvalidMonth(u8),

    /// A chart palette with no colours.
    #[error("the chart palette must contain at least one colour")]
    EmptyPalette,

    /// The chart axis step must be a positive number.
    #[error("the chart axis step must be greater than zero, got {0}")]
    InvalidAxisStep(f64),

    /// A referenced book, category or payment mode does not exist or belongs
    /// to another user.
    #[error("the referenced {0} does not exist")]
    InvalidReference(&'static str),

    /// An operation needed the active book but the session has none selected.
    #[error("no book has been selected")]
    NoActiveBook,

    /// A configured time zone name that is not a canonical IANA time zone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// A payload from the data store could not be parsed into its schema.
    #[error("could not parse response: {0}")]
    InvalidResponse(String),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Tried to update an expense that does not exist
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to update a book that does not exist
    #[error("tried to update a book that is not in the database")]
    UpdateMissingBook,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to update a payment mode that does not exist
    #[error("tried to update a payment mode that is not in the database")]
    UpdateMissingPaymentMode,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::InvalidReference("record")
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

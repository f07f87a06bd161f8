//! Core expense domain types.

use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    category::CategoryName,
    database_id::{BookId, CategoryId, ExpenseId, PaymentModeId, UserId},
    duration::calendar_day,
    payment_mode::PaymentModeName,
};

/// Money spent on a given day, recorded in one book.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The user that recorded the expense.
    pub user_id: UserId,
    /// The book the expense is recorded in.
    pub book_id: BookId,
    /// What the money was spent on.
    pub category_id: CategoryId,
    /// How the expense was paid.
    pub payment_mode_id: PaymentModeId,
    /// The amount spent, always greater than zero.
    pub amount: f64,
    /// The day the money was spent.
    #[serde(with = "calendar_day")]
    pub date: Date,
    /// A short note about the expense.
    pub remark: String,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The details needed to record an expense in the session's active book.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// What the money was spent on.
    pub category_id: CategoryId,
    /// How the expense was paid.
    pub payment_mode_id: PaymentModeId,
    /// The amount spent.
    pub amount: f64,
    /// The day the money was spent.
    pub date: Date,
    /// A short note about the expense.
    pub remark: String,
}

/// Changes to an expense. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseUpdate {
    /// The new category.
    pub category_id: Option<CategoryId>,
    /// The new payment mode.
    pub payment_mode_id: Option<PaymentModeId>,
    /// The new amount.
    pub amount: Option<f64>,
    /// The new date.
    pub date: Option<Date>,
    /// The new remark.
    pub remark: Option<String>,
}

/// An expense along with the names of its category and payment mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseWithDetails {
    /// The expense.
    #[serde(flatten)]
    pub expense: Expense,
    /// The name of the expense's category.
    pub category_name: CategoryName,
    /// The name of the expense's payment mode.
    pub payment_mode_name: PaymentModeName,
}

/// Check that `amount` is a positive number.
///
/// NaN fails the comparison and is rejected as well.
pub(crate) fn validate_amount(amount: f64) -> Result<f64, Error> {
    if amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::NonPositiveAmount(amount))
    }
}

/// Check that `remark` is not blank, returning it trimmed.
pub(crate) fn validate_remark(remark: &str) -> Result<String, Error> {
    let remark = remark.trim();

    if remark.is_empty() {
        Err(Error::EmptyRemark)
    } else {
        Ok(remark.to_owned())
    }
}

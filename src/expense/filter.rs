//! Compiles the expense list filter into backend-neutral constraints.
//!
//! The compiled form is a conjunction of [Constraint]s plus a fixed sort order
//! and a validated [PageRequest]. The expense queries turn it into SQL and
//! [CompiledFilter::matches] evaluates it against a single expense.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    database_id::{CategoryId, PaymentModeId},
    duration::calendar_day,
    expense::Expense,
    pagination::{PageRequest, PaginationConfig},
};

/// How an expense amount is compared with [AmountQuery::amount].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountCondition {
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
}

/// Limits expenses to those above or below an amount.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AmountQuery {
    /// The direction of the comparison.
    pub condition: AmountCondition,
    /// The amount to compare with. Amounts of zero or less disable the query.
    pub amount: f64,
}

/// The filters a user can set on the expense list.
///
/// Every field is optional, an empty filter lists all expenses in the book
/// on the default page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseFilter {
    /// Only expenses on or after this day.
    #[serde(with = "calendar_day::option")]
    pub start_date: Option<Date>,
    /// Only expenses on or before this day.
    #[serde(with = "calendar_day::option")]
    pub end_date: Option<Date>,
    /// Only expenses in one of these categories. Empty means any category.
    pub category_ids: BTreeSet<CategoryId>,
    /// Only expenses paid with one of these payment modes. Empty means any.
    pub payment_mode_ids: BTreeSet<PaymentModeId>,
    /// Only expenses whose remark contains this text, ignoring case.
    pub search_query: Option<String>,
    /// Only expenses above or below an amount.
    pub amount_query: Option<AmountQuery>,
    /// The page to fetch, the configured default when unset.
    pub page: Option<u64>,
    /// The number of expenses per page, the configured default when unset.
    pub page_size: Option<u64>,
}

/// A single condition that an expense must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// The expense date is on or after the given day.
    DateFrom(Date),
    /// The expense date is on or before the given day.
    DateTo(Date),
    /// The expense category is one of the given IDs.
    CategoryIn(Vec<CategoryId>),
    /// The expense payment mode is one of the given IDs.
    PaymentModeIn(Vec<PaymentModeId>),
    /// The remark contains the given text, ignoring case.
    RemarkContains(String),
    /// The amount is at least the given value.
    AmountAtLeast(f64),
    /// The amount is at most the given value.
    AmountAtMost(f64),
}

impl Constraint {
    /// Whether `expense` satisfies the constraint.
    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            Self::DateFrom(start) => expense.date >= *start,
            Self::DateTo(end) => expense.date <= *end,
            Self::CategoryIn(ids) => ids.contains(&expense.category_id),
            Self::PaymentModeIn(ids) => ids.contains(&expense.payment_mode_id),
            Self::RemarkContains(text) => expense
                .remark
                .to_lowercase()
                .contains(&text.to_lowercase()),
            Self::AmountAtLeast(amount) => expense.amount >= *amount,
            Self::AmountAtMost(amount) => expense.amount <= *amount,
        }
    }
}

/// A key that expenses are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Newest date first.
    DateDescending,
    /// Highest ID first.
    IdDescending,
}

/// Expenses are listed newest first, ties broken by the most recently
/// created expense.
pub const EXPENSE_SORT_ORDER: [SortKey; 2] = [SortKey::DateDescending, SortKey::IdDescending];

/// A validated filter ready to be run against a data store.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    /// Conditions that must all hold.
    pub constraints: Vec<Constraint>,
    /// The sort keys, most significant first.
    pub sort: [SortKey; 2],
    /// The page of results to return.
    pub page: PageRequest,
}

impl CompiledFilter {
    /// Whether `expense` satisfies every constraint. Pagination is ignored.
    pub fn matches(&self, expense: &Expense) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.matches(expense))
    }

    /// Compare two expenses by the filter's sort order.
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        self.sort
            .iter()
            .map(|key| match key {
                SortKey::DateDescending => b.date.cmp(&a.date),
                SortKey::IdDescending => b.id.cmp(&a.id),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

/// Compile `filter` into constraints, sort order and page request.
///
/// Blank search text and amount queries with an amount of zero or less are
/// ignored rather than rejected.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidPageSize] if the page size is zero,
/// - [Error::InvalidPage] if the page number is zero,
/// - [Error::InvalidDateRange] if the start date is after the end date.
pub fn compile_filter(
    filter: &ExpenseFilter,
    pagination_config: &PaginationConfig,
) -> Result<CompiledFilter, Error> {
    let page = pagination_config.page_request(filter.page, filter.page_size)?;

    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
    }

    let mut constraints = Vec::new();

    if let Some(start) = filter.start_date {
        constraints.push(Constraint::DateFrom(start));
    }

    if let Some(end) = filter.end_date {
        constraints.push(Constraint::DateTo(end));
    }

    if !filter.category_ids.is_empty() {
        constraints.push(Constraint::CategoryIn(
            filter.category_ids.iter().copied().collect(),
        ));
    }

    if !filter.payment_mode_ids.is_empty() {
        constraints.push(Constraint::PaymentModeIn(
            filter.payment_mode_ids.iter().copied().collect(),
        ));
    }

    if let Some(search_query) = &filter.search_query {
        let search_query = search_query.trim();

        if !search_query.is_empty() {
            constraints.push(Constraint::RemarkContains(search_query.to_owned()));
        }
    }

    match filter.amount_query {
        Some(AmountQuery { condition, amount }) if amount > 0.0 => {
            constraints.push(match condition {
                AmountCondition::Gte => Constraint::AmountAtLeast(amount),
                AmountCondition::Lte => Constraint::AmountAtMost(amount),
            });
        }
        _ => {}
    }

    let compiled = CompiledFilter {
        constraints,
        sort: EXPENSE_SORT_ORDER,
        page,
    };

    tracing::debug!("Compiled expense filter: {compiled:?}");

    Ok(compiled)
}

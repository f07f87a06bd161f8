//! Expense records and the expense list.
//!
//! This module contains:
//! - The [Expense] model and its validation
//! - Database functions for recording, updating and deleting expenses
//! - The filter compiler and the queries behind the expense list

mod db;
mod domain;
mod filter;
mod query;

pub use db::{create_expense, create_expense_table, delete_expense, get_expense, update_expense};
pub use domain::{Expense, ExpenseUpdate, ExpenseWithDetails, NewExpense};
pub use filter::{
    AmountCondition, AmountQuery, CompiledFilter, Constraint, EXPENSE_SORT_ORDER, ExpenseFilter,
    SortKey, compile_filter,
};
pub use query::{list_expenses, top_expenses, total_expenses};

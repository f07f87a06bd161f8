//! Categories group the expenses within a book, e.g. 'Groceries' or 'Rent'.

mod db;
mod domain;

pub use db::{create_category, create_category_table, get_categories, update_category};
pub use domain::{Category, CategoryName, CategoryUpdate};

//! Books are the ledgers that expenses are recorded in.

mod db;
mod domain;

pub use db::{create_book, create_book_table, get_book, get_books, update_book};
pub use domain::{Book, BookName, BookUpdate, NewBook};

//! Core book domain types.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{BookId, UserId},
    name::non_empty_name,
};

non_empty_name!(
    /// A validated, non-empty book name.
    BookName,
    Error::EmptyBookName
);

/// A named ledger, e.g. 'Household' or 'Trip to Goa'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// The ID of the book.
    pub id: BookId,
    /// The user that owns the book.
    pub user_id: UserId,
    /// The name of the book.
    pub name: BookName,
    /// What the book is used for.
    pub description: String,
    /// Inactive books are kept for their history but hidden from summaries.
    pub is_active: bool,
    /// When the book was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The details needed to create a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    /// The name of the book.
    pub name: BookName,
    /// What the book is used for.
    pub description: String,
}

/// Changes to a book. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    /// The new name.
    pub name: Option<BookName>,
    /// The new description.
    pub description: Option<String>,
    /// Activate or deactivate the book.
    pub is_active: Option<bool>,
}

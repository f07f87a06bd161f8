use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{BookId, CategoryId, UserId},
    name::non_empty_name,
};

non_empty_name!(
    /// A validated, non-empty category name.
    CategoryName,
    Error::EmptyCategoryName
);

/// A category of expenses within a single book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserId,
    /// The book the category belongs to.
    pub book_id: BookId,
    /// The name of the category.
    pub name: CategoryName,
    /// Inactive categories are hidden from pickers but keep their expenses.
    pub is_active: bool,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Changes to a category. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryUpdate {
    /// The new name.
    pub name: Option<CategoryName>,
    /// Activate or deactivate the category.
    pub is_active: Option<bool>,
}

//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Database identifier for a user.
pub type UserId = DatabaseId;
/// Database identifier for a book.
pub type BookId = DatabaseId;
/// Database identifier for a category.
pub type CategoryId = DatabaseId;
/// Database identifier for a payment mode.
pub type PaymentModeId = DatabaseId;
/// Database identifier for an expense.
pub type ExpenseId = DatabaseId;

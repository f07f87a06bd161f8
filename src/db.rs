//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior, functions::FunctionFlags};

use crate::{
    Error, book::create_book_table, category::create_category_table,
    expense::create_expense_table, payment_mode::create_payment_mode_table,
    user::create_user_table,
};

/// The name of the SQL function that lowercases text with Unicode case
/// folding. SQLite's built-in `lower` only handles ASCII.
pub(crate) const LOWER_UNICODE: &str = "lower_unicode";

/// Create the application's tables if they do not already exist, turn on
/// foreign key enforcement and register the application's SQL functions for
/// `connection`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    register_functions(connection)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_book_table(&transaction)?;
    create_category_table(&transaction)?;
    create_payment_mode_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

fn register_functions(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.create_scalar_function(
        LOWER_UNICODE,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| {
            let text: Option<String> = context.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

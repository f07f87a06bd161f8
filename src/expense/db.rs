//! Database operations for expense records.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    book::get_book,
    database_id::{BookId, CategoryId, ExpenseId, PaymentModeId},
    expense::{
        Expense, ExpenseUpdate, NewExpense,
        domain::{validate_amount, validate_remark},
    },
    session::Session,
};

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            payment_mode_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            date TEXT NOT NULL,
            remark TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES book(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT,
            FOREIGN KEY(payment_mode_id) REFERENCES payment_mode(id) ON UPDATE CASCADE ON DELETE RESTRICT
        );

        CREATE INDEX IF NOT EXISTS idx_expense_book_date ON expense(book_id, date);
        CREATE INDEX IF NOT EXISTS idx_expense_user ON expense(user_id);",
    )?;

    Ok(())
}

/// Record an expense in the session's active book.
///
/// The remark is stored trimmed. Inactive categories and payment modes are
/// accepted, they are only hidden from pickers.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NoActiveBook] if the session has no book selected,
/// - [Error::NonPositiveAmount] if the amount is not greater than zero,
/// - [Error::EmptyRemark] if the remark is blank,
/// - [Error::InvalidReference] if the book, category or payment mode does
///   not exist or belongs to another user or book,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    session: &Session,
    new_expense: NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let book_id = session.active_book()?;
    let amount = validate_amount(new_expense.amount)?;
    let remark = validate_remark(&new_expense.remark)?;

    get_book(session, book_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidReference("book"),
        error => error,
    })?;
    check_category(session, book_id, new_expense.category_id, connection)?;
    check_payment_mode(session, new_expense.payment_mode_id, connection)?;

    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO expense
            (user_id, book_id, category_id, payment_mode_id, amount, date, remark, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            session.user_id(),
            book_id,
            new_expense.category_id,
            new_expense.payment_mode_id,
            amount,
            new_expense.date,
            &remark,
            created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();
    tracing::debug!("Created expense {id} in book {book_id}");

    Ok(Expense {
        id,
        user_id: session.user_id(),
        book_id,
        category_id: new_expense.category_id,
        payment_mode_id: new_expense.payment_mode_id,
        amount,
        date: new_expense.date,
        remark,
        created_at,
    })
}

/// Retrieve one of the session user's expenses.
///
/// # Errors
///
/// Returns [Error::NotFound] if the expense does not exist or belongs to
/// another user.
pub fn get_expense(
    session: &Session,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(
            "SELECT id, user_id, book_id, category_id, payment_mode_id, amount, date, remark, created_at
             FROM expense WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((expense_id, session.user_id()), map_expense_row)
        .map_err(|error| error.into())
}

/// Apply `update` to an expense and return the updated expense.
///
/// A new category must belong to the same book as the expense.
///
/// # Errors
///
/// Returns [Error::UpdateMissingExpense] if the expense does not exist or
/// belongs to another user, and the validation errors of [create_expense]
/// for the fields that are set.
pub fn update_expense(
    session: &Session,
    expense_id: ExpenseId,
    update: ExpenseUpdate,
    connection: &Connection,
) -> Result<Expense, Error> {
    let existing = get_expense(session, expense_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UpdateMissingExpense,
        error => error,
    })?;

    let amount = update.amount.map(validate_amount).transpose()?;
    let remark = update
        .remark
        .as_deref()
        .map(validate_remark)
        .transpose()?;

    if let Some(category_id) = update.category_id {
        check_category(session, existing.book_id, category_id, connection)?;
    }

    if let Some(payment_mode_id) = update.payment_mode_id {
        check_payment_mode(session, payment_mode_id, connection)?;
    }

    let rows_affected = connection.execute(
        "UPDATE expense SET
            category_id = COALESCE(?1, category_id),
            payment_mode_id = COALESCE(?2, payment_mode_id),
            amount = COALESCE(?3, amount),
            date = COALESCE(?4, date),
            remark = COALESCE(?5, remark)
         WHERE id = ?6 AND user_id = ?7",
        (
            update.category_id,
            update.payment_mode_id,
            amount,
            update.date,
            remark,
            expense_id,
            session.user_id(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    get_expense(session, expense_id, connection)
}

/// Permanently delete one of the session user's expenses.
///
/// # Errors
///
/// Returns [Error::DeleteMissingExpense] if the expense does not exist or
/// belongs to another user.
pub fn delete_expense(
    session: &Session,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, session.user_id()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    tracing::debug!("Deleted expense {expense_id}");

    Ok(())
}

/// Map a row of `id, user_id, book_id, category_id, payment_mode_id, amount,
/// date, remark, created_at` to an [Expense].
pub(crate) fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        category_id: row.get(3)?,
        payment_mode_id: row.get(4)?,
        amount: row.get(5)?,
        date: row.get(6)?,
        remark: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn check_category(
    session: &Session,
    book_id: BookId,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .query_row(
            "SELECT id FROM category WHERE id = ?1 AND user_id = ?2 AND book_id = ?3",
            (category_id, session.user_id(), book_id),
            |row| row.get::<_, CategoryId>(0),
        )
        .optional()?
        .map(|_| ())
        .ok_or(Error::InvalidReference("category"))
}

fn check_payment_mode(
    session: &Session,
    payment_mode_id: PaymentModeId,
    connection: &Connection,
) -> Result<(), Error> {
    connection
        .query_row(
            "SELECT id FROM payment_mode WHERE id = ?1 AND user_id = ?2",
            (payment_mode_id, session.user_id()),
            |row| row.get::<_, PaymentModeId>(0),
        )
        .optional()?
        .map(|_| ())
        .ok_or(Error::InvalidReference("payment mode"))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        book::{BookName, NewBook, create_book},
        category::{CategoryName, create_category},
        db::initialize,
        expense::{
            ExpenseUpdate, NewExpense, create_expense, delete_expense, get_expense,
            update_expense,
        },
        payment_mode::{PaymentModeName, create_payment_mode},
        session::Session,
        user::{NewUser, Username, register_user},
    };

    struct Fixture {
        connection: Connection,
        session: Session,
        category_id: i64,
        payment_mode_id: i64,
    }

    fn log_in(username: &str, connection: &Connection) -> Session {
        let user = register_user(
            NewUser {
                username: Username::new_unchecked(username),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            },
            connection,
        )
        .unwrap();

        Session::log_in(&user)
    }

    fn fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let mut session = log_in("asha", &connection);
        let book = create_book(
            &session,
            NewBook {
                name: BookName::new_unchecked("Home"),
                description: String::new(),
            },
            &connection,
        )
        .unwrap();
        session.select_book(&book).unwrap();
        let category =
            create_category(&session, book.id, CategoryName::new_unchecked("Food"), &connection)
                .unwrap();
        let payment_mode =
            create_payment_mode(&session, PaymentModeName::new_unchecked("Cash"), &connection)
                .unwrap();

        Fixture {
            connection,
            session,
            category_id: category.id,
            payment_mode_id: payment_mode.id,
        }
    }

    fn new_expense(fixture: &Fixture, amount: f64, remark: &str) -> NewExpense {
        NewExpense {
            category_id: fixture.category_id,
            payment_mode_id: fixture.payment_mode_id,
            amount,
            date: date!(2025 - 11 - 03),
            remark: remark.to_owned(),
        }
    }

    #[test]
    fn create_and_get_expense() {
        let fixture = fixture();

        let created = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, " Vegetables "),
            &fixture.connection,
        )
        .unwrap();
        let fetched = get_expense(&fixture.session, created.id, &fixture.connection).unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.remark, "Vegetables");
        assert_eq!(fetched.date, date!(2025 - 11 - 03));
    }

    #[test]
    fn create_without_active_book_fails() {
        let mut fixture = fixture();
        fixture.session.clear_book();

        let got = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, "Vegetables"),
            &fixture.connection,
        );

        assert_eq!(got, Err(Error::NoActiveBook));
    }

    #[test]
    fn create_rejects_invalid_amount_and_remark() {
        let fixture = fixture();

        let zero = create_expense(
            &fixture.session,
            new_expense(&fixture, 0.0, "Vegetables"),
            &fixture.connection,
        );
        let blank = create_expense(
            &fixture.session,
            new_expense(&fixture, 10.0, "  "),
            &fixture.connection,
        );

        assert_eq!(zero, Err(Error::NonPositiveAmount(0.0)));
        assert_eq!(blank, Err(Error::EmptyRemark));
    }

    #[test]
    fn create_rejects_unknown_category_and_payment_mode() {
        let fixture = fixture();

        let bad_category = create_expense(
            &fixture.session,
            NewExpense {
                category_id: 999,
                ..new_expense(&fixture, 10.0, "Vegetables")
            },
            &fixture.connection,
        );
        let bad_payment_mode = create_expense(
            &fixture.session,
            NewExpense {
                payment_mode_id: 999,
                ..new_expense(&fixture, 10.0, "Vegetables")
            },
            &fixture.connection,
        );

        assert_eq!(bad_category, Err(Error::InvalidReference("category")));
        assert_eq!(bad_payment_mode, Err(Error::InvalidReference("payment mode")));
    }

    #[test]
    fn update_changes_only_given_fields() {
        let fixture = fixture();
        let expense = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, "Vegetables"),
            &fixture.connection,
        )
        .unwrap();

        let updated = update_expense(
            &fixture.session,
            expense.id,
            ExpenseUpdate {
                amount: Some(300.0),
                date: Some(date!(2025 - 11 - 04)),
                ..Default::default()
            },
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(updated.amount, 300.0);
        assert_eq!(updated.date, date!(2025 - 11 - 04));
        assert_eq!(updated.remark, expense.remark);
        assert_eq!(updated.category_id, expense.category_id);
    }

    #[test]
    fn update_validates_new_values() {
        let fixture = fixture();
        let expense = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, "Vegetables"),
            &fixture.connection,
        )
        .unwrap();

        let got = update_expense(
            &fixture.session,
            expense.id,
            ExpenseUpdate {
                amount: Some(-1.0),
                ..Default::default()
            },
            &fixture.connection,
        );

        assert_eq!(got, Err(Error::NonPositiveAmount(-1.0)));
    }

    #[test]
    fn update_and_delete_other_users_expense_fail() {
        let fixture = fixture();
        let expense = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, "Vegetables"),
            &fixture.connection,
        )
        .unwrap();
        let intruder = log_in("ravi", &fixture.connection);

        let update = update_expense(
            &intruder,
            expense.id,
            ExpenseUpdate::default(),
            &fixture.connection,
        );
        let delete = delete_expense(&intruder, expense.id, &fixture.connection);

        assert_eq!(update, Err(Error::UpdateMissingExpense));
        assert_eq!(delete, Err(Error::DeleteMissingExpense));
        assert!(get_expense(&fixture.session, expense.id, &fixture.connection).is_ok());
    }

    #[test]
    fn delete_removes_expense() {
        let fixture = fixture();
        let expense = create_expense(
            &fixture.session,
            new_expense(&fixture, 250.0, "Vegetables"),
            &fixture.connection,
        )
        .unwrap();

        delete_expense(&fixture.session, expense.id, &fixture.connection).unwrap();

        assert_eq!(
            get_expense(&fixture.session, expense.id, &fixture.connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_expense(&fixture.session, expense.id, &fixture.connection),
            Err(Error::DeleteMissingExpense)
        );
    }
}

//! Database operations for books.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    book::{Book, BookName, BookUpdate, NewBook},
    database_id::BookId,
    session::Session,
};

/// Initialize the book table and indexes.
pub fn create_book_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS book (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_book_user ON book(user_id);",
    )?;

    Ok(())
}

/// Create a book owned by the session's user.
pub fn create_book(
    session: &Session,
    new_book: NewBook,
    connection: &Connection,
) -> Result<Book, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO book (user_id, name, description, is_active, created_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        (
            session.user_id(),
            new_book.name.as_ref(),
            &new_book.description,
            created_at,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Book {
        id,
        user_id: session.user_id(),
        name: new_book.name,
        description: new_book.description,
        is_active: true,
        created_at,
    })
}

/// Retrieve one of the session user's books.
///
/// # Errors
///
/// Returns [Error::NotFound] if the book does not exist or belongs to another user.
pub fn get_book(session: &Session, book_id: BookId, connection: &Connection) -> Result<Book, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, description, is_active, created_at
             FROM book WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((book_id, session.user_id()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the session user's books, newest first.
pub fn get_books(session: &Session, connection: &Connection) -> Result<Vec<Book>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, description, is_active, created_at
             FROM book WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map([session.user_id()], map_row)?
        .map(|maybe_book| maybe_book.map_err(|error| error.into()))
        .collect()
}

/// Apply `update` to a book and return the updated book.
///
/// # Errors
///
/// Returns [Error::UpdateMissingBook] if the book does not exist or belongs to another user.
pub fn update_book(
    session: &Session,
    book_id: BookId,
    update: BookUpdate,
    connection: &Connection,
) -> Result<Book, Error> {
    let rows_affected = connection.execute(
        "UPDATE book SET
            name = COALESCE(?1, name),
            description = COALESCE(?2, description),
            is_active = COALESCE(?3, is_active)
         WHERE id = ?4 AND user_id = ?5",
        (
            update.name.as_ref().map(AsRef::<str>::as_ref),
            update.description,
            update.is_active,
            book_id,
            session.user_id(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBook);
    }

    get_book(session, book_id, connection)
}

fn map_row(row: &Row) -> Result<Book, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Book {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: BookName::new_unchecked(&raw_name),
        description: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        book::{BookName, BookUpdate, NewBook, create_book, get_book, get_books, update_book},
        db::initialize,
        session::Session,
        user::{NewUser, Username, register_user},
    };

    fn get_test_connection_and_session() -> (Connection, Session) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = register_user(
            NewUser {
                username: Username::new_unchecked("asha"),
                first_name: "Asha".to_owned(),
                last_name: "Rao".to_owned(),
                email: "asha@example.com".to_owned(),
            },
            &connection,
        )
        .unwrap();

        (connection, Session::log_in(&user))
    }

    fn new_book(name: &str) -> NewBook {
        NewBook {
            name: BookName::new(name).unwrap(),
            description: format!("{name} expenses"),
        }
    }

    #[test]
    fn book_name_is_trimmed_and_must_not_be_empty() {
        assert_eq!(BookName::new("  Home "), Ok(BookName::new_unchecked("Home")));
        assert_eq!(BookName::new(""), Err(Error::EmptyBookName));
    }

    #[test]
    fn create_and_get_book() {
        let (connection, session) = get_test_connection_and_session();

        let created = create_book(&session, new_book("Home"), &connection).unwrap();
        let fetched = get_book(&session, created.id, &connection).unwrap();

        assert_eq!(created, fetched);
        assert!(fetched.is_active);
    }

    #[test]
    fn get_books_lists_newest_first() {
        let (connection, session) = get_test_connection_and_session();
        let first = create_book(&session, new_book("Home"), &connection).unwrap();
        let second = create_book(&session, new_book("Travel"), &connection).unwrap();

        let books = get_books(&session, &connection).unwrap();

        let ids: Vec<_> = books.iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn books_of_other_users_are_hidden() {
        let (connection, session) = get_test_connection_and_session();
        let book = create_book(&session, new_book("Home"), &connection).unwrap();
        let other_user = register_user(
            NewUser {
                username: Username::new_unchecked("ravi"),
                first_name: "Ravi".to_owned(),
                last_name: "Rao".to_owned(),
                email: "ravi@example.com".to_owned(),
            },
            &connection,
        )
        .unwrap();
        let other_session = Session::log_in(&other_user);

        assert_eq!(
            get_book(&other_session, book.id, &connection),
            Err(Error::NotFound)
        );
        assert!(get_books(&other_session, &connection).unwrap().is_empty());
    }

    #[test]
    fn update_only_changes_given_fields() {
        let (connection, session) = get_test_connection_and_session();
        let book = create_book(&session, new_book("Home"), &connection).unwrap();

        let updated = update_book(
            &session,
            book.id,
            BookUpdate {
                is_active: Some(false),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert!(!updated.is_active);
        assert_eq!(updated.name, book.name);
        assert_eq!(updated.description, book.description);
    }

    #[test]
    fn update_missing_book_fails() {
        let (connection, session) = get_test_connection_and_session();

        let got = update_book(&session, 42, BookUpdate::default(), &connection);

        assert_eq!(got, Err(Error::UpdateMissingBook));
    }
}

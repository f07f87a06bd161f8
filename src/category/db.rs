use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    book::get_book,
    category::{Category, CategoryName, CategoryUpdate},
    database_id::{BookId, CategoryId},
    session::Session,
};

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(book_id) REFERENCES book(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_book ON category(book_id);",
    )?;

    Ok(())
}

/// Create a category in one of the session user's books.
///
/// # Errors
///
/// Returns [Error::InvalidReference] if the book does not exist or belongs
/// to another user.
pub fn create_category(
    session: &Session,
    book_id: BookId,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    get_book(session, book_id, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidReference("book"),
        error => error,
    })?;

    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO category (user_id, book_id, name, is_active, created_at)
         VALUES (?1, ?2, ?3, 1, ?4)",
        (session.user_id(), book_id, name.as_ref(), created_at),
    )?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id: session.user_id(),
        book_id,
        name,
        is_active: true,
        created_at,
    })
}

/// Retrieve the categories of a book ordered by name.
///
/// Inactive categories are skipped unless `include_inactive` is set.
pub fn get_categories(
    session: &Session,
    book_id: BookId,
    include_inactive: bool,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, book_id, name, is_active, created_at
             FROM category
             WHERE user_id = ?1 AND book_id = ?2 AND (?3 OR is_active)
             ORDER BY name ASC, id ASC",
        )?
        .query_map((session.user_id(), book_id, include_inactive), map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Rename or (de)activate a category.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the category does not exist or
/// belongs to another user.
pub fn update_category(
    session: &Session,
    category_id: CategoryId,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection.execute(
        "UPDATE category SET
            name = COALESCE(?1, name),
            is_active = COALESCE(?2, is_active)
         WHERE id = ?3 AND user_id = ?4",
        (
            update.name.as_ref().map(AsRef::<str>::as_ref),
            update.is_active,
            category_id,
            session.user_id(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    connection
        .prepare(
            "SELECT id, user_id, book_id, name, is_active, created_at
             FROM category WHERE id = ?1",
        )?
        .query_row([category_id], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        book_id: row.get(2)?,
        name: CategoryName::new_unchecked(&raw_name),
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        book::{Book, BookName, NewBook, create_book},
        category::{CategoryName, CategoryUpdate, create_category, get_categories, update_category},
        db::initialize,
        session::Session,
        user::{NewUser, Username, register_user},
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn log_in(username: &str, connection: &Connection) -> Session {
        let user = register_user(
            NewUser {
                username: Username::new_unchecked(username),
                first_name: String::new(),
                last_name: String::new(),
                email: format!("{username}@example.com"),
            },
            connection,
        )
        .unwrap();

        Session::log_in(&user)
    }

    fn create_test_book(session: &Session, connection: &Connection) -> Book {
        create_book(
            session,
            NewBook {
                name: BookName::new_unchecked("Home"),
                description: String::new(),
            },
            connection,
        )
        .unwrap()
    }

    #[test]
    fn create_category_in_own_book() {
        let connection = get_test_connection();
        let session = log_in("asha", &connection);
        let book = create_test_book(&session, &connection);

        let category = create_category(
            &session,
            book.id,
            CategoryName::new("Groceries").unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(category.book_id, book.id);
        assert_eq!(category.user_id, session.user_id());
        assert!(category.is_active);
    }

    #[test]
    fn create_category_in_other_users_book_fails() {
        let connection = get_test_connection();
        let owner = log_in("asha", &connection);
        let book = create_test_book(&owner, &connection);
        let intruder = log_in("ravi", &connection);

        let got = create_category(
            &intruder,
            book.id,
            CategoryName::new_unchecked("Groceries"),
            &connection,
        );

        assert_eq!(got, Err(Error::InvalidReference("book")));
    }

    #[test]
    fn get_categories_orders_by_name_and_hides_inactive() {
        let connection = get_test_connection();
        let session = log_in("asha", &connection);
        let book = create_test_book(&session, &connection);
        let rent = create_category(&session, book.id, CategoryName::new_unchecked("Rent"), &connection)
            .unwrap();
        let food = create_category(&session, book.id, CategoryName::new_unchecked("Food"), &connection)
            .unwrap();
        let old = create_category(&session, book.id, CategoryName::new_unchecked("Gym"), &connection)
            .unwrap();
        update_category(
            &session,
            old.id,
            CategoryUpdate {
                is_active: Some(false),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        let active: Vec<_> = get_categories(&session, book.id, false, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.id)
            .collect();
        let all: Vec<_> = get_categories(&session, book.id, true, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.id)
            .collect();

        assert_eq!(active, vec![food.id, rent.id]);
        assert_eq!(all, vec![food.id, old.id, rent.id]);
    }

    #[test]
    fn rename_category() {
        let connection = get_test_connection();
        let session = log_in("asha", &connection);
        let book = create_test_book(&session, &connection);
        let category =
            create_category(&session, book.id, CategoryName::new_unchecked("Food"), &connection)
                .unwrap();

        let updated = update_category(
            &session,
            category.id,
            CategoryUpdate {
                name: Some(CategoryName::new_unchecked("Groceries")),
                is_active: None,
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.name, CategoryName::new_unchecked("Groceries"));
        assert!(updated.is_active);
    }

    #[test]
    fn update_other_users_category_fails() {
        let connection = get_test_connection();
        let owner = log_in("asha", &connection);
        let book = create_test_book(&owner, &connection);
        let category =
            create_category(&owner, book.id, CategoryName::new_unchecked("Food"), &connection)
                .unwrap();
        let intruder = log_in("ravi", &connection);

        let got = update_category(&intruder, category.id, CategoryUpdate::default(), &connection);

        assert_eq!(got, Err(Error::UpdateMissingCategory));
    }
}

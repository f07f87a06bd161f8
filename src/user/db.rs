//! Database operations for users.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    user::{NewUser, User, Username},
};

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Register a new user and return it with its generated ID.
///
/// # Errors
///
/// Returns [Error::DuplicateUsername] if the username is already registered
/// or [Error::SqlError] if there is some other SQL error.
pub fn register_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO user (username, first_name, last_name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                new_user.username.as_ref(),
                &new_user.first_name,
                &new_user.last_name,
                &new_user.email,
                created_at,
            ),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateUsername(new_user.username.to_string())
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();
    tracing::info!("Registered user {} with ID {id}", new_user.username);

    Ok(User {
        id,
        username: new_user.username,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        email: new_user.email,
        created_at,
    })
}

/// Get the user registered under `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that username.
pub fn get_user_by_username(username: &Username, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, first_name, last_name, email, created_at
             FROM user WHERE username = :username",
        )?
        .query_row(&[(":username", username.as_ref())], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_username: String = row.get(1)?;

    Ok(User {
        id: row.get(0)?,
        username: Username::new_unchecked(&raw_username),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

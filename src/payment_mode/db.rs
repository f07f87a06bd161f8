use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::PaymentModeId,
    payment_mode::{PaymentMode, PaymentModeName, PaymentModeUpdate},
    session::Session,
};

/// Initialize the payment mode table.
pub fn create_payment_mode_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment_mode (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Create a payment mode for the session's user.
pub fn create_payment_mode(
    session: &Session,
    name: PaymentModeName,
    connection: &Connection,
) -> Result<PaymentMode, Error> {
    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO payment_mode (user_id, name, is_active, created_at) VALUES (?1, ?2, 1, ?3)",
        (session.user_id(), name.as_ref(), created_at),
    )?;

    Ok(PaymentMode {
        id: connection.last_insert_rowid(),
        user_id: session.user_id(),
        name,
        is_active: true,
        created_at,
    })
}

/// Retrieve the session user's payment modes, newest first.
///
/// Inactive payment modes are skipped unless `include_inactive` is set.
pub fn get_payment_modes(
    session: &Session,
    include_inactive: bool,
    connection: &Connection,
) -> Result<Vec<PaymentMode>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, is_active, created_at
             FROM payment_mode
             WHERE user_id = ?1 AND (?2 OR is_active)
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map((session.user_id(), include_inactive), map_row)?
        .map(|maybe_mode| maybe_mode.map_err(|error| error.into()))
        .collect()
}

/// Rename or (de)activate a payment mode.
///
/// # Errors
///
/// Returns [Error::UpdateMissingPaymentMode] if the payment mode does not
/// exist or belongs to another user.
pub fn update_payment_mode(
    session: &Session,
    payment_mode_id: PaymentModeId,
    update: PaymentModeUpdate,
    connection: &Connection,
) -> Result<PaymentMode, Error> {
    let rows_affected = connection.execute(
        "UPDATE payment_mode SET
            name = COALESCE(?1, name),
            is_active = COALESCE(?2, is_active)
         WHERE id = ?3 AND user_id = ?4",
        (
            update.name.as_ref().map(AsRef::<str>::as_ref),
            update.is_active,
            payment_mode_id,
            session.user_id(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingPaymentMode);
    }

    connection
        .prepare(
            "SELECT id, user_id, name, is_active, created_at FROM payment_mode WHERE id = ?1",
        )?
        .query_row([payment_mode_id], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<PaymentMode, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(PaymentMode {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: PaymentModeName::new_unchecked(&raw_name),
        is_active: row.get(3)?,
        created_at: row.get(4)?,
    })
}

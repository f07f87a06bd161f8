//! Core user domain types.

use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, database_id::UserId, name::non_empty_name};

non_empty_name!(
    /// A validated, non-empty username.
    Username,
    Error::EmptyUsername
);

/// The details needed to register a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The user's email address.
    pub email: String,
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The user's email address.
    pub email: String,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

//! The logged in user and their selected book.

use crate::{
    Error,
    book::Book,
    database_id::{BookId, UserId},
    user::User,
};

/// Who is using the application and which book they are working in.
///
/// A session is opened with [Session::log_in] and ended with
/// [Session::log_out]. Every store function that reads or writes user data
/// takes the session so that queries are always scoped to its user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    active_book: Option<BookId>,
}

impl Session {
    /// Open a session for `user` with no book selected.
    pub fn log_in(user: &User) -> Self {
        tracing::debug!("Opened session for user {}", user.id);

        Self {
            user_id: user.id,
            active_book: None,
        }
    }

    /// End the session.
    pub fn log_out(self) {
        tracing::debug!("Closed session for user {}", self.user_id);
    }

    /// The ID of the logged in user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Make `book` the book that expenses are read from and written to.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidReference] if `book` belongs to another user.
    pub fn select_book(&mut self, book: &Book) -> Result<(), Error> {
        if book.user_id != self.user_id {
            return Err(Error::InvalidReference("book"));
        }

        self.active_book = Some(book.id);

        Ok(())
    }

    /// Deselect the active book.
    pub fn clear_book(&mut self) {
        self.active_book = None;
    }

    /// The ID of the selected book.
    ///
    /// # Errors
    ///
    /// Returns [Error::NoActiveBook] if no book has been selected.
    pub fn active_book(&self) -> Result<BookId, Error> {
        self.active_book.ok_or(Error::NoActiveBook)
    }
}

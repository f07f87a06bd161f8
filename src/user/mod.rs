//! Registered users and their lookup.

mod db;
mod domain;

pub use db::{create_user_table, get_user_by_username, register_user};
pub use domain::{NewUser, User, Username};

//! Payment modes describe how an expense was paid, e.g. 'Cash' or 'UPI'.

mod db;
mod domain;

pub use db::{create_payment_mode, create_payment_mode_table, get_payment_modes, update_payment_mode};
pub use domain::{PaymentMode, PaymentModeName, PaymentModeUpdate};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{PaymentModeId, UserId},
    name::non_empty_name,
};

non_empty_name!(
    /// A validated, non-empty payment mode name.
    PaymentModeName,
    Error::EmptyPaymentModeName
);

/// A way of paying that is shared across all of a user's books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMode {
    /// The ID of the payment mode.
    pub id: PaymentModeId,
    /// The user that owns the payment mode.
    pub user_id: UserId,
    /// The name of the payment mode.
    pub name: PaymentModeName,
    /// Inactive payment modes are hidden from pickers.
    pub is_active: bool,
    /// When the payment mode was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Changes to a payment mode. Fields left as `None` are not changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentModeUpdate {
    /// The new name.
    pub name: Option<PaymentModeName>,
    /// Activate or deactivate the payment mode.
    pub is_active: Option<bool>,
}

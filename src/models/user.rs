use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// The owner of a transaction.
///
/// The credential hash is read from storage but never serialized back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String
}

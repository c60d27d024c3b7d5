use crate::models::User;
use crate::types::{Amount, Timestamp, TransactionId, UserId};

/// A transaction as submitted by a caller, before the store has assigned it an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The owning user. Must reference an existing user when inserted.
    pub user_id: UserId,
    /// Free-form kind, conventionally `deposit` or `withdrawal`.
    pub transaction_type: String,
    /// Any sign is accepted; a withdrawal may be recorded as negative or positive.
    pub amount: Amount,
    /// When the transaction occurred.
    pub transaction_date: Timestamp
}

/// A stored transaction record.
///
/// `user` is only populated by lookups that join the owning user; every other
/// field is always present once the record has been inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Store-assigned, unique and immutable.
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub transaction_type: String,
    pub amount: Amount,
    pub transaction_date: Timestamp,
    /// Set by the store at insertion.
    pub created_at: Timestamp,
    pub user: Option<User>
}

impl Transaction {
    /// Builds the stored form of `new` under the given identity.
    pub fn create(transaction_id: TransactionId, new: NewTransaction, created_at: Timestamp) -> Self {
        Self {
            transaction_id,
            user_id: new.user_id,
            transaction_type: new.transaction_type,
            amount: new.amount,
            transaction_date: new.transaction_date,
            created_at,
            user: None
        }
    }

    /// Returns this record with the owning user attached.
    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}

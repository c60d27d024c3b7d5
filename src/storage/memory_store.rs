use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use crate::models::{NewTransaction, Transaction, User};
use crate::storage::{StorageError, TransactionQuery, TransactionStore};
use crate::types::{TransactionId, UserId};

/// Concurrent in-memory transaction and user tables.
///
/// Identifiers come from a shared sequence that only moves forward, so a
/// failed insert may leave a gap but never reuses an identifier.
pub struct MemoryStore {
    transactions: DashMap<TransactionId, Transaction>,
    users: DashMap<UserId, User>,
    sequence: AtomicU32
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
            users: DashMap::new(),
            sequence: AtomicU32::new(0)
        }
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.user_id, user);
    }

    pub fn user(&self, user_id: UserId) -> Option<User> {
        self.users.get(&user_id).map(|user| user.value().clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Validates the owning user and assigns identity without publishing the record.
    pub(crate) fn stage(&self, transaction: NewTransaction) -> Result<Transaction, StorageError> {
        if !self.users.contains_key(&transaction.user_id) {
            return Err(StorageError::unknown_user(transaction.user_id));
        }

        let transaction_id = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        Ok(Transaction::create(transaction_id, transaction, Utc::now().naive_utc()))
    }

    /// Publishes a record that already carries its identity.
    pub(crate) fn restore(&self, transaction: Transaction) {
        self.sequence.fetch_max(transaction.transaction_id, Ordering::SeqCst);
        self.transactions.insert(transaction.transaction_id, transaction.with_user(None));
    }

    /// Runs `query` against a point-in-time copy of the table.
    pub fn select(&self, query: &TransactionQuery) -> Vec<Transaction> {
        let selected = query.evaluate(self.snapshot());

        debug!("Selected {} of {} transactions", selected.len(), self.transactions.len());

        if query.with_user {
            selected.into_iter().map(|transaction| self.join(transaction)).collect()
        } else {
            selected
        }
    }

    pub fn find(&self, transaction_id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&transaction_id)
            .map(|transaction| self.join(transaction.value().clone()))
    }

    fn snapshot(&self) -> Vec<Transaction> {
        let mut records: Vec<Transaction> = self.transactions.iter()
            .map(|item| item.value().clone())
            .collect();

        records.sort_by_key(|transaction| transaction.transaction_id);
        records
    }

    fn join(&self, transaction: Transaction) -> Transaction {
        let user = self.user(transaction.user_id);
        transaction.with_user(user)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StorageError> {
        let transaction = self.stage(transaction)?;
        self.restore(transaction.clone());

        Ok(transaction)
    }

    async fn query_all(&self, with_user: bool) -> Result<Vec<Transaction>, StorageError> {
        let mut query = TransactionQuery::default();
        query.with_user = with_user;

        Ok(self.select(&query))
    }

    async fn query_by_id(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StorageError> {
        Ok(self.find(transaction_id))
    }

    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.select(&query))
    }
}

mod csv_store;
mod errors;
mod memory_store;
mod query;

use async_trait::async_trait;

use crate::models::{NewTransaction, Transaction};
use crate::types::TransactionId;

pub use csv_store::CsvStore;
pub use errors::StorageError;
pub use memory_store::MemoryStore;
pub use query::{Predicate, SortOrder, TransactionQuery, TypeMatch};

/// An ordered collection of transaction records.
///
/// Results always start from ascending identifier order, which is also
/// insertion order. Implementations own the atomicity of a single insert and
/// any isolation between concurrent callers.
#[async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// Persists a new record, assigning its identifier and creation timestamp.
    ///
    /// # Errors
    /// Returns `StorageError` if the owning user does not exist or the write
    /// cannot be committed.
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StorageError>;

    /// Every record, optionally joined with its owning user.
    async fn query_all(&self, with_user: bool) -> Result<Vec<Transaction>, StorageError>;

    /// A single record joined with its owning user.
    async fn query_by_id(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StorageError>;

    /// Records matching `query.predicate`, ordered and paged as requested.
    ///
    /// A `skip` of zero or less skips nothing. A `take` of zero or less
    /// returns an empty page. Timestamp ties keep ascending identifier order.
    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, StorageError>;
}

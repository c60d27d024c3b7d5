use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::models::{DateRangeAndTypeFilter, DateRangeFilter, NewTransaction, Transaction, TransactionFilter};
use crate::service::ServiceError;
use crate::storage::{Predicate, SortOrder, StorageError, TransactionQuery, TransactionStore, TypeMatch};
use crate::types::{TransactionId, UserId};

/// Retrieval and filtering of transaction records over a `TransactionStore`.
///
/// The service keeps no state of its own beyond the store handle; every call
/// goes to the store. Lookups that find nothing return `None` or an empty
/// vector. Only bad input and store failures are errors.
///
/// Type matching is not uniform across operations: `get_by_type` ignores
/// letter case, while `get_by_date_range_and_type` and `get_filtered` compare
/// the type exactly.
pub struct TransactionService<S: TransactionStore> {
    storage: Arc<S>
}

impl<S: TransactionStore> TransactionService<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Every record, joined with its owning user.
    pub async fn get_all(&self) -> Result<Vec<Transaction>, ServiceError> {
        let transactions = self.storage.query_all(true).await
            .map_err(|source| Self::fault("get_all", String::new(), source))?;

        debug!("Fetched {} transactions", transactions.len());

        Ok(transactions)
    }

    /// The record with `transaction_id`, joined with its owning user.
    pub async fn get_by_id(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, ServiceError> {
        let transaction = self.storage.query_by_id(transaction_id).await
            .map_err(|source| Self::fault("get_by_id", format!("transaction_id={transaction_id}"), source))?;

        if transaction.is_none() {
            debug!("Transaction [{transaction_id}] not found");
        }

        Ok(transaction)
    }

    /// Inserts `transaction` and returns it with its assigned identifier.
    ///
    /// Not idempotent: the same input submitted twice creates two records.
    ///
    /// # Errors
    /// `InvalidInput` if no transaction was supplied, otherwise any store failure.
    pub async fn add(&self, transaction: Option<NewTransaction>) -> Result<Transaction, ServiceError> {
        let Some(transaction) = transaction else {
            warn!("Attempted to add a missing transaction");
            return Err(ServiceError::invalid_input("add", "transaction cannot be null"));
        };

        let context = format!("user_id={} transaction_type={}", transaction.user_id, transaction.transaction_type);

        let created = self.storage.insert(transaction).await
            .map_err(|source| Self::fault("add", context, source))?;

        info!("Created transaction [{}] for user [{}]", created.transaction_id, created.user_id);

        Ok(created)
    }

    /// Records owned by `user_id`, without the user joined.
    pub async fn get_by_user_id(&self, user_id: UserId) -> Result<Vec<Transaction>, ServiceError> {
        let query = TransactionQuery::new(Predicate::all().user(user_id));

        self.storage.query(query).await
            .map_err(|source| Self::fault("get_by_user_id", format!("user_id={user_id}"), source))
    }

    /// Records whose type equals `transaction_type` ignoring letter case, joined with the user.
    ///
    /// An absent, empty or whitespace-only type short-circuits to an empty
    /// result without touching the store.
    pub async fn get_by_type(&self, transaction_type: Option<&str>) -> Result<Vec<Transaction>, ServiceError> {
        let Some(transaction_type) = transaction_type.filter(|value| !value.trim().is_empty()) else {
            debug!("Blank transaction type, returning no transactions");
            return Ok(Vec::new());
        };

        let folded = transaction_type.to_lowercase();
        let query = TransactionQuery::new(Predicate::all().of_type(TypeMatch::IgnoreCase(folded))).join_user();

        self.storage.query(query).await
            .map_err(|source| Self::fault("get_by_type", format!("transaction_type={transaction_type}"), source))
    }

    /// Records dated within `[start_date, end_date]`, joined with the user.
    ///
    /// # Errors
    /// `InvalidInput` if either bound is unset.
    pub async fn get_by_date_range(&self, filter: &DateRangeFilter) -> Result<Vec<Transaction>, ServiceError> {
        let Some((start_date, end_date)) = filter.bounds() else {
            return Err(ServiceError::invalid_input("get_by_date_range", "invalid date range"));
        };

        let query = TransactionQuery::new(Predicate::all().between(start_date, end_date)).join_user();

        self.storage.query(query).await
            .map_err(|source| Self::fault("get_by_date_range", format!("start_date={start_date} end_date={end_date}"), source))
    }

    /// Records dated within `[start_date, end_date]` whose type matches exactly,
    /// letter case included. The user is not joined.
    ///
    /// # Errors
    /// `InvalidInput` if either bound is unset.
    pub async fn get_by_date_range_and_type(&self, filter: &DateRangeAndTypeFilter) -> Result<Vec<Transaction>, ServiceError> {
        let Some((start_date, end_date)) = filter.bounds() else {
            return Err(ServiceError::invalid_input("get_by_date_range_and_type", "invalid date range"));
        };

        let predicate = Predicate::all()
            .between(start_date, end_date)
            .of_type(TypeMatch::Exact(filter.transaction_type.clone()));

        self.storage.query(TransactionQuery::new(predicate)).await
            .map_err(|source| {
                let context = format!("start_date={start_date} end_date={end_date} transaction_type={}", filter.transaction_type);
                Self::fault("get_by_date_range_and_type", context, source)
            })
    }

    /// One page of a user's records within `[start_date, end_date]` whose type
    /// matches exactly, newest first, joined with the user.
    ///
    /// `offset` and `limit` go to the store as-is; see `TransactionStore::query`
    /// for how it treats zero and negative values.
    pub async fn get_filtered(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>, ServiceError> {
        let predicate = Predicate::all()
            .user(filter.user_id)
            .between(filter.start_date, filter.end_date)
            .of_type(TypeMatch::Exact(filter.transaction_type.clone()));

        let query = TransactionQuery::new(predicate)
            .order_by(SortOrder::TransactionDateDescending)
            .page(filter.offset, filter.limit)
            .join_user();

        self.storage.query(query).await
            .map_err(|source| Self::fault("get_filtered", format!("{filter:?}"), source))
    }

    fn fault(operation: &'static str, context: String, source: StorageError) -> ServiceError {
        error!("Storage failure in [{operation}] ({context}): {source}");
        ServiceError::storage(operation, context, source)
    }
}

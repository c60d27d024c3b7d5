use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use csv::{ReaderBuilder, Trim, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};

use crate::models::{NewTransaction, Transaction, User};
use crate::storage::{MemoryStore, StorageError, TransactionQuery, TransactionStore};
use crate::types::{Amount, Timestamp, TransactionId, UserId};

pub const USERS_FILE: &str = "users.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

const TRANSACTION_HEADERS: [&str; 6] = ["transaction_id", "user_id", "transaction_type", "amount", "transaction_date", "created_at"];

/// One line of `transactions.csv`.
#[derive(Debug, Serialize, Deserialize)]
struct TransactionRow {
    transaction_id: TransactionId,
    user_id: UserId,
    transaction_type: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Amount,
    transaction_date: Timestamp,
    created_at: Timestamp
}

impl From<&Transaction> for TransactionRow {
    fn from(transaction: &Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            user_id: transaction.user_id,
            transaction_type: transaction.transaction_type.clone(),
            amount: transaction.amount,
            transaction_date: transaction.transaction_date,
            created_at: transaction.created_at
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Self {
            transaction_id: row.transaction_id,
            user_id: row.user_id,
            transaction_type: row.transaction_type,
            amount: row.amount,
            transaction_date: row.transaction_date,
            created_at: row.created_at,
            user: None
        }
    }
}

/// Durable store over a data directory holding `users.csv` and `transactions.csv`.
///
/// Both tables are loaded into a `MemoryStore` on open and reads are served
/// from there. Inserts append to `transactions.csv` and sync it before the
/// record becomes visible. A failed append is truncated away.
pub struct CsvStore {
    tables: Arc<CsvTables>
}

struct CsvTables {
    index: MemoryStore,
    transactions_path: PathBuf,
    file: Mutex<File>
}

impl CsvStore {
    /// Opens (creating if needed) the tables under `directory`.
    ///
    /// # Errors
    /// Returns `StorageError` if the directory cannot be created, or either
    /// table cannot be read or contains a malformed row.
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self, StorageError> {
        let directory = directory.as_ref().to_path_buf();
        let tables = spawn_blocking(move || CsvTables::load(&directory)).await??;

        Ok(Self { tables: Arc::new(tables) })
    }

    /// Swaps the handle appends are written through, returning the previous one.
    #[cfg(test)]
    pub(super) async fn replace_file(&self, file: File) -> File {
        std::mem::replace(&mut *self.tables.file.lock().await, file)
    }
}

impl CsvTables {
    fn load(directory: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(directory).map_err(|source| StorageError::io(directory, source))?;

        let index = MemoryStore::new();
        let users_path = directory.join(USERS_FILE);
        let transactions_path = directory.join(TRANSACTIONS_FILE);

        if users_path.exists() {
            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .from_path(&users_path)
                .map_err(|source| StorageError::csv(&users_path, source))?;

            for result in reader.deserialize::<User>() {
                index.add_user(result.map_err(|source| StorageError::csv(&users_path, source))?);
            }
        }

        if transactions_path.exists() {
            let mut reader = ReaderBuilder::new()
                .from_path(&transactions_path)
                .map_err(|source| StorageError::csv(&transactions_path, source))?;

            for result in reader.deserialize::<TransactionRow>() {
                let row = result.map_err(|source| StorageError::csv(&transactions_path, source))?;
                index.restore(row.into());
            }
        }

        let needs_header = fs::metadata(&transactions_path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&transactions_path)
            .map_err(|source| StorageError::io(&transactions_path, source))?;

        if needs_header {
            let header = encode(&transactions_path, |writer| writer.write_record(TRANSACTION_HEADERS))?;
            write_all_or_truncate(&mut file, &transactions_path, &header)?;
        }

        info!("Loaded {} users and {} transactions from {}", index.user_count(), index.len(), directory.display());

        Ok(Self {
            index,
            transactions_path,
            file: Mutex::new(file)
        })
    }

    /// Must run on the blocking pool. Holds the file lock from identity
    /// assignment until the record is published so rows land in identifier order.
    fn append(&self, transaction: NewTransaction) -> Result<Transaction, StorageError> {
        let mut file = self.file.blocking_lock();
        let transaction = self.index.stage(transaction)?;

        let row = encode(&self.transactions_path, |writer| writer.serialize(TransactionRow::from(&transaction)))?;
        write_all_or_truncate(&mut file, &self.transactions_path, &row)?;

        self.index.restore(transaction.clone());

        debug!("Appended transaction [{}] for user [{}]", transaction.transaction_id, transaction.user_id);

        Ok(transaction)
    }
}

/// Renders CSV records into memory so nothing stays buffered after a failed write.
fn encode(path: &Path, write: impl FnOnce(&mut Writer<Vec<u8>>) -> csv::Result<()>) -> Result<Vec<u8>, StorageError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    write(&mut writer).map_err(|source| StorageError::csv(path, source))?;

    writer.into_inner()
        .map_err(|error| StorageError::io(path, io::Error::new(error.error().kind(), error.error().to_string())))
}

/// Appends `bytes` and syncs them to disk. On failure the file is cut back to
/// its previous length so a partial row cannot resurface on the next open.
fn write_all_or_truncate(file: &mut File, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let length = file.metadata()
        .map_err(|source| StorageError::io(path, source))?
        .len();

    if let Err(source) = file.write_all(bytes).and_then(|()| file.sync_data()) {
        if let Err(truncate_error) = file.set_len(length) {
            error!("Could not truncate {} back to {length} bytes after a failed append: {truncate_error}", path.display());
        }

        return Err(StorageError::io(path, source));
    }

    Ok(())
}

#[async_trait]
impl TransactionStore for CsvStore {
    async fn insert(&self, transaction: NewTransaction) -> Result<Transaction, StorageError> {
        let tables = self.tables.clone();

        //NOTE: The blocking task runs to completion even if this future is dropped,
        //      so a row is never written without also being indexed.
        spawn_blocking(move || tables.append(transaction)).await?
    }

    async fn query_all(&self, with_user: bool) -> Result<Vec<Transaction>, StorageError> {
        self.tables.index.query_all(with_user).await
    }

    async fn query_by_id(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StorageError> {
        self.tables.index.query_by_id(transaction_id).await
    }

    async fn query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, StorageError> {
        self.tables.index.query(query).await
    }
}

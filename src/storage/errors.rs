use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::UserId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("User [{user_id}] does not exist")]
    UnknownUser {
        user_id: UserId
    },
    #[error("I/O failure on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },
    #[error("CSV failure on {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error
    },
    #[error("Storage task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError)
}

impl StorageError {
    pub fn unknown_user(user_id: UserId) -> Self {
        Self::UnknownUser { user_id }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv { path: path.to_path_buf(), source }
    }
}

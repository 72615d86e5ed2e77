use redb::{Database as RedbDatabase, ReadTransaction, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::{USER_VIDEOS, VIDEOS};

const DATABASE_FILE: &str = "tubely.redb";

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Any redb failure: open, transaction, table, storage, or commit.
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Record decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("Record encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! from_redb_error {
    ($($source:ident),* $(,)?) => {
        $(
            impl From<redb::$source> for DatabaseError {
                fn from(e: redb::$source) -> Self {
                    DatabaseError::Redb(Box::new(e.into()))
                }
            }
        )*
    };
}

from_redb_error!(
    Error,
    DatabaseError,
    TransactionError,
    TableError,
    StorageError,
    CommitError,
);

/// Video metadata store. Clones share one redb handle.
#[derive(Clone)]
pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Database {
    /// Open or create the database file inside `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let path = data_dir.as_ref().join(DATABASE_FILE);
        let db = RedbDatabase::create(&path)?;

        // Tables must exist before the first read transaction opens them
        let write_txn = db.begin_write()?;
        write_txn.open_table(VIDEOS)?;
        write_txn.open_table(USER_VIDEOS)?;
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }
}

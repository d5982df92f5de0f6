use thiserror::Error;
use uuid::Uuid;

/// Business failures of the points ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("No transactions found for this user")]
    NoRecords,

    #[error("Not enough points to subtract: requested {requested}, available {available}")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Invalid points amount: {0}")]
    InvalidAmount(i64),

    #[error("Points balance for payer {payer} exceeds the supported range")]
    BalanceOverflow { payer: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by a record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record {0} no longer exists")]
    RecordNotFound(Uuid),

    #[error("record {0} already exists")]
    DuplicateRecord(Uuid),
}

/// Errors that can occur while processing an operations file
/// Row-level business rejections are logged and skipped, never raised here
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type Result<T> = std::result::Result<T, ProcessingError>;

//! Error types for ledger commands and the key-value store.

/// Failures raised by the backing key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error on key `{key}`: {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// Validation and persistence failures of a ledger command.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(f64),

    #[error("price must not be negative, got {0}")]
    InvalidPrice(f64),

    #[error("no open position for {0}")]
    NoPosition(String),

    #[error("cannot sell {requested} of {ticker}: holding {held}")]
    InsufficientQuantity {
        ticker: String,
        requested: f64,
        held: f64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

use crate::config::ConfigError;
use crate::domain::money::Money;
use crate::domain::order::{OrderId, OrderStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrderError>;

/// Broad classification used by callers to decide whether a failure is worth
/// retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-input fault. Retrying the same request fails the same way.
    Validation,
    /// Store or environment fault. Retry policy belongs to the caller.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("order has no lines")]
    EmptyOrder,
    #[error("menu item `{0}` not found")]
    ItemNotFound(String),
    #[error("menu item `{0}` is unavailable")]
    ItemUnavailable(String),
    #[error("invalid quantity `{quantity}` for item `{item_id}`")]
    InvalidQuantity { item_id: String, quantity: String },
    #[error("payment amount {actual} does not match order total {expected}")]
    AmountMismatch { expected: Money, actual: Money },
    #[error("payment currency {actual} does not match order currency {expected}")]
    CurrencyMismatch { expected: String, actual: String },
    #[error("order {0} not found")]
    OrderNotFound(OrderId),
    #[error("invalid order transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),
    #[error("order {0} already has a payment")]
    DuplicatePayment(OrderId),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("agent exceeded {0} tool rounds without answering")]
    ToolLoopExceeded(u32),
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
}

impl OrderError {
    pub fn persistence(message: impl Into<String>) -> Self {
        let message: String = message.into();
        OrderError::PersistenceFailure(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::PersistenceFailure(_)
            | OrderError::IoError(_)
            | OrderError::ConfigError(_)
            | OrderError::ToolLoopExceeded(_) => ErrorKind::Infrastructure,
            OrderError::CsvError(e) if e.is_io_error() => ErrorKind::Infrastructure,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for OrderError {
    fn from(e: rocksdb::Error) -> Self {
        OrderError::PersistenceFailure(Box::new(e))
    }
}

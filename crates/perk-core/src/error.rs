//! Error types for ledger operations.

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
///
/// Domain errors (`EmployeeNotFound`, `MerchNotFound`, `InvalidCredential`,
/// `SelfTransferNotAllowed`, `InsufficientBalance`, `InvalidAmount`) are
/// expected outcomes: the caller can branch on them and no state was
/// mutated. `Storage` is opaque infrastructure failure; the transaction it
/// happened in was aborted.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No employee with the given name or id.
    #[error("employee not found")]
    EmployeeNotFound,

    /// No catalog item with the given name.
    #[error("merch not found")]
    MerchNotFound,

    /// Password does not match the stored verifier.
    #[error("invalid credential")]
    InvalidCredential,

    /// Transfers from an account to itself are rejected before any
    /// transaction opens.
    #[error("sending points to yourself is not allowed")]
    SelfTransferNotAllowed,

    /// The locked account cannot cover the requested debit.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Balance read under the row lock.
        balance: i64,
        /// Amount the operation needed.
        required: i64,
    },

    /// Transfer and purchase amounts must be positive.
    #[error("amount must be positive")]
    InvalidAmount,

    /// An account with this username already exists.
    ///
    /// Only observed transiently inside provisioning when a concurrent
    /// request wins the creation race; never surfaced to callers.
    #[error("employee already exists")]
    AlreadyExists,

    /// Storage failure, wrapped with the operation that hit it.
    #[error("storage error in {op}: {message}")]
    Storage {
        /// Name of the failing store operation.
        op: &'static str,
        /// Underlying store error rendered to a string.
        message: String,
    },
}

impl LedgerError {
    /// Wrap a store-layer error with the name of the failing operation.
    pub fn storage(op: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Storage {
            op,
            message: source.to_string(),
        }
    }
}

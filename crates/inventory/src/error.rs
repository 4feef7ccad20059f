//! Inventory error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

use stockflow_core::DomainError;

use crate::ids::ProductId;
use crate::status::DocumentStatus;

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failures surfaced by the ledger and the stock workflows.
///
/// Every variant aborts the enclosing transaction; nothing is compensated
/// locally. Callers map these to validation errors or retry (see
/// [`InventoryError::is_retryable`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Quantity not strictly positive, or finer than three decimal places.
    #[error("invalid quantity {0}: must be greater than zero with at most 3 decimal places")]
    InvalidQuantity(Decimal),

    /// Unit price negative, or finer than two decimal places.
    #[error("invalid unit price {0}")]
    InvalidUnitPrice(Decimal),

    /// Malformed movement direction code.
    #[error("invalid movement direction: {0:?}")]
    InvalidDirection(String),

    /// An OUT movement would drive the balance negative.
    #[error(
        "insufficient stock for product {product}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        product: ProductId,
        available: Decimal,
        requested: Decimal,
    },

    /// An IN movement would push the balance past the largest storable quantity.
    #[error("balance overflow for product {product}: balance {available}, adding {requested}")]
    BalanceOverflow {
        product: ProductId,
        available: Decimal,
        requested: Decimal,
    },

    /// Only drafts can be completed.
    #[error("{document} is {status}; only drafts can be completed")]
    InvalidTransition {
        document: String,
        status: DocumentStatus,
    },

    /// No product row for this tenant.
    #[error("product {product} not found")]
    ProductNotFound { product: ProductId },

    #[error("stock adjustment type {name:?} not found")]
    AdjustmentTypeNotFound { name: String },

    #[error("{0} not found")]
    DocumentNotFound(String),

    /// The product row lock could not be acquired in time.
    #[error("timed out waiting for the stock lock on product {product}")]
    LockTimeout { product: ProductId },

    /// A workflow header changed underneath the transaction.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage-level failure (poisoned lock, broken invariant in the store).
    #[error("storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl InventoryError {
    /// Whether a caller may reasonably retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InventoryError::LockTimeout { .. }
                | InventoryError::Conflict(_)
                | InventoryError::InsufficientStock { .. }
        )
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

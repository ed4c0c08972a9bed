//! Error types for the `commons-pool` crate.
//!
//! All fallible operations in this crate return [`PoolError`] through the
//! standard [`Result`] type alias.

use commons_types::HarvestOrder;
use rust_decimal::Decimal;

/// Errors that can occur when constructing or mutating a resource pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The configured harvesting order is recognized but not implemented
    /// by this engine. Surfaced at construction, never retried: it signals
    /// a misconfigured experiment, not a runtime fault.
    #[error("unsupported harvesting order: {order}")]
    UnsupportedHarvestOrder {
        /// The unsupported mode, named so the misconfiguration is obvious.
        order: HarvestOrder,
    },

    /// The carrying capacity must be strictly positive.
    #[error("pool capacity must be positive, got {capacity}")]
    InvalidCapacity {
        /// The invalid capacity.
        capacity: Decimal,
    },

    /// The initial stock must satisfy `0 <= stock <= capacity`.
    #[error("initial stock {stock} outside [0, {capacity}]")]
    StockOutOfBounds {
        /// The invalid stock.
        stock: Decimal,
        /// The configured capacity.
        capacity: Decimal,
    },

    /// A harvest request carried a negative quantity.
    #[error("harvest request must be non-negative, got {requested}")]
    NegativeRequest {
        /// The invalid request.
        requested: Decimal,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in pool calculation")]
    ArithmeticOverflow,
}

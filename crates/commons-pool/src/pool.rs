//! The shared resource pool: harvesting and regeneration rules.
//!
//! A [`ResourcePool`] holds the current `stock` and a fixed `capacity`.
//! Within a round every agent's request is resolved against the running
//! stock — requests are granted `min(requested, stock)`, so a group that
//! jointly over-requests draws the pre-round stock down to exactly zero,
//! never below. After all agents have acted, [`regenerate`] doubles the
//! remaining stock and clamps it at capacity, exactly once per round.
//!
//! The invariant `0 <= stock <= capacity` holds after every harvest and
//! every regeneration step.
//!
//! [`regenerate`]: ResourcePool::regenerate

use commons_types::HarvestOrder;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::PoolError;

/// Regeneration multiplier: the stock doubles each round, up to capacity.
const REGROWTH_FACTOR: Decimal = Decimal::TWO;

/// The shared renewable stock all agents draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePool {
    /// Current amount of shared resource.
    stock: Decimal,
    /// Maximum stock the pool can hold (carrying capacity).
    capacity: Decimal,
}

impl ResourcePool {
    /// Create a pool with the given initial stock and carrying capacity,
    /// under the given harvesting order.
    ///
    /// Only [`HarvestOrder::Concurrent`] is implemented; any other mode is
    /// a fatal configuration error surfaced here, at construction.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnsupportedHarvestOrder`] for a mode other
    /// than `concurrent`, [`PoolError::InvalidCapacity`] if `capacity` is
    /// not positive, or [`PoolError::StockOutOfBounds`] if
    /// `initial_stock` is outside `[0, capacity]`.
    pub fn new(
        initial_stock: Decimal,
        capacity: Decimal,
        order: HarvestOrder,
    ) -> Result<Self, PoolError> {
        if order != HarvestOrder::Concurrent {
            return Err(PoolError::UnsupportedHarvestOrder { order });
        }

        if capacity <= Decimal::ZERO {
            return Err(PoolError::InvalidCapacity { capacity });
        }

        if initial_stock < Decimal::ZERO || initial_stock > capacity {
            return Err(PoolError::StockOutOfBounds {
                stock: initial_stock,
                capacity,
            });
        }

        Ok(Self {
            stock: initial_stock,
            capacity,
        })
    }

    /// The current stock.
    pub const fn stock(&self) -> Decimal {
        self.stock
    }

    /// The carrying capacity.
    pub const fn capacity(&self) -> Decimal {
        self.capacity
    }

    /// Grant a harvest request against the running stock.
    ///
    /// Returns the granted amount, `min(requested, stock)`: if the pool
    /// has less than requested, the entire remainder is taken and the
    /// stock bottoms out at exactly zero. Side effect: the stock is
    /// decremented by the granted amount.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NegativeRequest`] for a negative quantity, or
    /// [`PoolError::ArithmeticOverflow`] if checked arithmetic fails.
    pub fn harvest(&mut self, requested: Decimal) -> Result<Decimal, PoolError> {
        if requested < Decimal::ZERO {
            return Err(PoolError::NegativeRequest { requested });
        }

        let granted = requested.min(self.stock);
        self.stock = self
            .stock
            .checked_sub(granted)
            .ok_or(PoolError::ArithmeticOverflow)?;

        debug!(%requested, %granted, stock = %self.stock, "Harvest granted");
        Ok(granted)
    }

    /// Apply one round of regeneration: `stock = min(capacity, stock * 2)`.
    ///
    /// Called exactly once per round, after all agents have harvested.
    /// Returns the amount actually regrown (zero when the pool is empty
    /// or already at capacity).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ArithmeticOverflow`] if checked arithmetic
    /// fails.
    pub fn regenerate(&mut self) -> Result<Decimal, PoolError> {
        let doubled = self
            .stock
            .checked_mul(REGROWTH_FACTOR)
            .ok_or(PoolError::ArithmeticOverflow)?;

        let new_stock = doubled.min(self.capacity);
        let regrown = new_stock
            .checked_sub(self.stock)
            .ok_or(PoolError::ArithmeticOverflow)?;
        self.stock = new_stock;

        debug!(%regrown, stock = %self.stock, "Pool regenerated");
        Ok(regrown)
    }
}

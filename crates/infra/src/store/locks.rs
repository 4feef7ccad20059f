//! Per-product row locks.
//!
//! An exclusive lock on `(tenant, product)` serializes every read-check-write
//! of that product's balance. Locks are owned by a transaction id and released
//! all at once when the transaction commits or rolls back. Products never
//! contend with each other.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use stockflow_core::TenantId;
use stockflow_inventory::{InventoryError, ProductId};

pub(crate) type RowKey = (TenantId, ProductId);

/// Identifier of an open transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TxId(pub(crate) u64);

#[derive(Debug, Default)]
pub(crate) struct RowLocks {
    held: Mutex<HashMap<RowKey, TxId>>,
    released: Condvar,
}

impl RowLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Acquire `key` for `owner`, waiting at most `timeout`. Re-entrant.
    pub(crate) fn acquire(
        &self,
        key: RowKey,
        owner: TxId,
        timeout: Duration,
    ) -> Result<(), InventoryError> {
        let deadline = Instant::now() + timeout;
        let mut held = self
            .held
            .lock()
            .map_err(|_| InventoryError::storage("row lock table poisoned"))?;

        loop {
            match held.get(&key) {
                None => {
                    held.insert(key, owner);
                    return Ok(());
                }
                Some(current) if *current == owner => return Ok(()),
                Some(_) => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(InventoryError::LockTimeout { product: key.1 });
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| InventoryError::storage("row lock table poisoned"))?;
            held = guard;
        }
    }

    pub(crate) fn is_held_by(&self, key: &RowKey, owner: TxId) -> Result<bool, InventoryError> {
        self.held
            .lock()
            .map(|held| held.get(key) == Some(&owner))
            .map_err(|_| InventoryError::storage("row lock table poisoned"))
    }

    /// Release every lock held by `owner`.
    pub(crate) fn release_all(&self, owner: TxId) {
        let released = match self.held.lock() {
            Ok(mut held) => {
                let before = held.len();
                held.retain(|_, o| *o != owner);
                before != held.len()
            }
            Err(poisoned) => {
                poisoned.into_inner().retain(|_, o| *o != owner);
                true
            }
        };
        if released {
            self.released.notify_all();
        }
    }
}

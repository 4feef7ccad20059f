use std::collections::HashMap;

use rust_decimal::Decimal;

use stockflow_core::{AggregateRoot, ExpectedVersion, TenantId};
use stockflow_inventory::{
    AdjustmentTypeLookup, InventoryError, InventoryResult, ProductId, StockAdjustment,
    StockAdjustmentId, StockAdjustmentType, StockEntry, StockEntryId, StockMovement,
};

use super::locks::{RowKey, TxId};
use super::{InventoryStore, TenantStore};

#[derive(Debug)]
struct Pending<T> {
    /// Version the committed record must have for this write to apply.
    expected: ExpectedVersion,
    value: T,
}

/// Unit of work over an [`InventoryStore`].
///
/// All writes are buffered and become visible together on [`commit`]. Row
/// locks taken through [`lock_product`] are held until the transaction ends,
/// whether it commits or is dropped (rollback).
///
/// [`commit`]: Transaction::commit
/// [`lock_product`]: Transaction::lock_product
#[derive(Debug)]
pub struct Transaction<'s> {
    store: &'s InventoryStore,
    id: TxId,
    balances: HashMap<RowKey, Decimal>,
    movements: Vec<StockMovement>,
    entries: HashMap<(TenantId, StockEntryId), Pending<StockEntry>>,
    adjustments: HashMap<(TenantId, StockAdjustmentId), Pending<StockAdjustment>>,
    committed: bool,
}

impl<'s> Transaction<'s> {
    pub(super) fn new(store: &'s InventoryStore, id: TxId) -> Self {
        Self {
            store,
            id,
            balances: HashMap::new(),
            movements: Vec::new(),
            entries: HashMap::new(),
            adjustments: HashMap::new(),
            committed: false,
        }
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn product_exists(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> InventoryResult<bool> {
        Ok(self
            .store
            .read_state()?
            .products
            .contains_key(&(tenant_id, product_id)))
    }

    /// Lock the product row and return its current balance.
    ///
    /// Blocks while another transaction holds the row, up to the store's lock
    /// timeout. The balance is read after the lock is granted.
    pub fn lock_product(
        &mut self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> InventoryResult<Decimal> {
        let key = (tenant_id, product_id);
        if !self.product_exists(tenant_id, product_id)? {
            return Err(InventoryError::ProductNotFound { product: product_id });
        }

        self.store
            .locks()
            .acquire(key, self.id, self.store.lock_timeout())?;

        if let Some(pending) = self.balances.get(&key) {
            return Ok(*pending);
        }
        self.store
            .read_state()?
            .products
            .get(&key)
            .map(|p| p.balance)
            .ok_or(InventoryError::ProductNotFound { product: product_id })
    }

    /// Buffer a new balance for a row this transaction has locked.
    pub fn write_balance(
        &mut self,
        tenant_id: TenantId,
        product_id: ProductId,
        balance: Decimal,
    ) -> InventoryResult<()> {
        let key = (tenant_id, product_id);
        if !self.store.locks().is_held_by(&key, self.id)? {
            return Err(InventoryError::storage(format!(
                "balance write for product {product_id} without holding its lock"
            )));
        }
        if balance < Decimal::ZERO {
            return Err(InventoryError::storage(format!(
                "refusing negative balance {balance} for product {product_id}"
            )));
        }
        self.balances.insert(key, balance);
        Ok(())
    }

    pub fn append_movement(&mut self, movement: StockMovement) {
        self.movements.push(movement);
    }

    /// Movements appended so far, not yet committed.
    pub fn pending_movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub fn stock_entry(
        &self,
        tenant_id: TenantId,
        id: StockEntryId,
    ) -> InventoryResult<Option<StockEntry>> {
        if let Some(pending) = self.entries.get(&(tenant_id, id)) {
            return Ok(Some(pending.value.clone()));
        }
        Ok(self.store.read_state()?.entries.get(tenant_id, &id))
    }

    /// Buffer a header write. `expected` is checked against the committed
    /// version at commit time (and against any earlier write in this
    /// transaction immediately).
    pub fn put_stock_entry(
        &mut self,
        entry: StockEntry,
        expected: ExpectedVersion,
    ) -> InventoryResult<()> {
        let key = (entry.tenant_id(), *entry.id());
        stage(&mut self.entries, key, entry, expected, "stock entry")
    }

    pub fn stock_adjustment(
        &self,
        tenant_id: TenantId,
        id: StockAdjustmentId,
    ) -> InventoryResult<Option<StockAdjustment>> {
        if let Some(pending) = self.adjustments.get(&(tenant_id, id)) {
            return Ok(Some(pending.value.clone()));
        }
        Ok(self.store.read_state()?.adjustments.get(tenant_id, &id))
    }

    pub fn put_stock_adjustment(
        &mut self,
        adjustment: StockAdjustment,
        expected: ExpectedVersion,
    ) -> InventoryResult<()> {
        let key = (adjustment.tenant_id(), *adjustment.id());
        stage(&mut self.adjustments, key, adjustment, expected, "stock adjustment")
    }

    /// Publish every buffered write at once.
    ///
    /// Header versions are validated before anything is applied; on failure
    /// the transaction is rolled back and nothing becomes visible.
    pub fn commit(mut self) -> InventoryResult<()> {
        let mut state = self.store.write_state()?;

        for ((tenant_id, id), pending) in &self.entries {
            let current = state
                .entries
                .get(*tenant_id, id)
                .map(|e| e.version())
                .unwrap_or(0);
            pending
                .expected
                .check(current)
                .map_err(|e| InventoryError::Conflict(format!("stock entry {id}: {e}")))?;
        }
        for ((tenant_id, id), pending) in &self.adjustments {
            let current = state
                .adjustments
                .get(*tenant_id, id)
                .map(|a| a.version())
                .unwrap_or(0);
            pending
                .expected
                .check(current)
                .map_err(|e| InventoryError::Conflict(format!("stock adjustment {id}: {e}")))?;
        }
        if let Some((_, product_id)) = self
            .balances
            .keys()
            .find(|key| !state.products.contains_key(*key))
        {
            return Err(InventoryError::storage(format!(
                "product {product_id} vanished during transaction"
            )));
        }

        for (key, balance) in self.balances.drain() {
            if let Some(row) = state.products.get_mut(&key) {
                row.balance = balance;
            }
        }
        let movement_count = self.movements.len();
        for mut movement in self.movements.drain(..) {
            state.last_sequence += 1;
            movement.assign_sequence(state.last_sequence);
            state.movements.push(movement);
        }
        for ((tenant_id, id), pending) in self.entries.drain() {
            state.entries.upsert(tenant_id, id, pending.value);
        }
        for ((tenant_id, id), pending) in self.adjustments.drain() {
            state.adjustments.upsert(tenant_id, id, pending.value);
        }
        drop(state);

        self.committed = true;
        tracing::debug!(tx = self.id.0, movements = movement_count, "transaction committed");
        Ok(())
    }
}

impl AdjustmentTypeLookup for Transaction<'_> {
    fn find_adjustment_type(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> InventoryResult<Option<StockAdjustmentType>> {
        self.store.find_adjustment_type(tenant_id, name)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.movements.is_empty() {
            tracing::debug!(
                tx = self.id.0,
                discarded_movements = self.movements.len(),
                "transaction rolled back"
            );
        }
        self.store.locks().release_all(self.id);
    }
}

fn stage<K, T>(
    pending: &mut HashMap<K, Pending<T>>,
    key: K,
    value: T,
    expected: ExpectedVersion,
    kind: &str,
) -> InventoryResult<()>
where
    K: Eq + core::hash::Hash + core::fmt::Debug,
    T: AggregateRoot,
{
    match pending.get_mut(&key) {
        Some(existing) => {
            expected
                .check(existing.value.version())
                .map_err(|e| InventoryError::Conflict(format!("{kind} {key:?}: {e}")))?;
            existing.value = value;
        }
        None => {
            pending.insert(key, Pending { expected, value });
        }
    }
    Ok(())
}

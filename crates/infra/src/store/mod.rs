//! In-memory inventory storage with row locks and unit-of-work transactions.
//!
//! ## Model
//!
//! - **Product rows** hold the materialized on-hand balance per (tenant, product).
//! - **The ledger** is an append-only `Vec<StockMovement>` in commit order.
//! - **Workflow headers** (entries, adjustments) live in tenant-isolated tables
//!   and are versioned for optimistic concurrency.
//!
//! Writes go through a [`Transaction`]: reads see committed state plus the
//! transaction's own pending writes, and `commit()` publishes everything under
//! one write section so no partial state is ever observable. Balance reads for
//! writing take the product's row lock, which is held until the transaction
//! ends (like `SELECT ... FOR UPDATE`).

mod locks;
mod tenant_store;
mod transaction;

pub use locks::TxId;
pub use tenant_store::{InMemoryTenantStore, TenantStore};
pub use transaction::Transaction;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use rust_decimal::Decimal;

use stockflow_core::{DomainError, TenantId};
use stockflow_inventory::{
    AdjustmentTypeLookup, InventoryError, InventoryResult, ProductId, Quantity, SourceDocument,
    StockAdjustment, StockAdjustmentId, StockAdjustmentType, StockEntry, StockEntryId,
    StockMovement, resolve_adjustment_type,
};

use crate::config::InventoryConfig;
use locks::{RowKey, RowLocks};

/// Snapshot of a product's stock row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub(crate) products: HashMap<RowKey, ProductStock>,
    pub(crate) movements: Vec<StockMovement>,
    pub(crate) entries: InMemoryTenantStore<StockEntryId, StockEntry>,
    pub(crate) adjustments: InMemoryTenantStore<StockAdjustmentId, StockAdjustment>,
    pub(crate) adjustment_types: Vec<StockAdjustmentType>,
    /// Sequence of the most recently committed movement.
    pub(crate) last_sequence: u64,
}

/// Tenant-isolated inventory store.
///
/// Intended for tests/dev and single-process deployments.
#[derive(Debug)]
pub struct InventoryStore {
    lock_timeout: Duration,
    locks: RowLocks,
    state: RwLock<StoreState>,
    next_tx: AtomicU64,
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new(&InventoryConfig::default())
    }
}

impl InventoryStore {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            lock_timeout: config.lock_timeout,
            locks: RowLocks::new(),
            state: RwLock::new(StoreState::default()),
            next_tx: AtomicU64::new(1),
        }
    }

    /// Open a unit of work. Dropping it without `commit()` rolls it back.
    pub fn begin(&self) -> Transaction<'_> {
        let id = TxId(self.next_tx.fetch_add(1, Ordering::Relaxed));
        Transaction::new(self, id)
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub(crate) fn locks(&self) -> &RowLocks {
        &self.locks
    }

    pub(crate) fn read_state(&self) -> InventoryResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| InventoryError::storage("inventory state lock poisoned"))
    }

    pub(crate) fn write_state(&self) -> InventoryResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| InventoryError::storage("inventory state lock poisoned"))
    }

    /// Seed a product row with its opening balance.
    ///
    /// The product catalog is external; this is the hand-off point where a
    /// product becomes known to the ledger.
    pub fn register_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        name: impl Into<String>,
        opening_balance: Quantity,
    ) -> InventoryResult<()> {
        if opening_balance.value() < Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity(opening_balance.value()));
        }

        let mut state = self.write_state()?;
        let key = (tenant_id, product_id);
        if state.products.contains_key(&key) {
            return Err(
                DomainError::conflict(format!("product {product_id} already registered")).into(),
            );
        }
        state.products.insert(
            key,
            ProductStock {
                tenant_id,
                product_id,
                name: name.into(),
                balance: opening_balance.value(),
            },
        );
        tracing::debug!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            balance = %opening_balance,
            "product registered"
        );
        Ok(())
    }

    /// Add an adjustment type; (tenant, name) is unique, names compare case-insensitively.
    pub fn register_adjustment_type(
        &self,
        adjustment_type: StockAdjustmentType,
    ) -> InventoryResult<()> {
        let mut state = self.write_state()?;
        let duplicate = state.adjustment_types.iter().any(|t| {
            t.tenant_id() == adjustment_type.tenant_id() && t.has_name(adjustment_type.name())
        });
        if duplicate {
            return Err(DomainError::conflict(format!(
                "adjustment type {:?} already exists",
                adjustment_type.name()
            ))
            .into());
        }
        state.adjustment_types.push(adjustment_type);
        Ok(())
    }

    /// Adjustment types visible to `tenant_id`, sorted by name.
    pub fn adjustment_types(
        &self,
        tenant_id: TenantId,
    ) -> InventoryResult<Vec<StockAdjustmentType>> {
        let state = self.read_state()?;
        let mut types: Vec<_> = state
            .adjustment_types
            .iter()
            .filter(|t| t.visible_to(tenant_id))
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(types)
    }

    pub fn product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> InventoryResult<Option<ProductStock>> {
        Ok(self.read_state()?.products.get(&(tenant_id, product_id)).cloned())
    }

    /// Committed on-hand balance.
    pub fn balance(&self, tenant_id: TenantId, product_id: ProductId) -> InventoryResult<Decimal> {
        self.product(tenant_id, product_id)?
            .map(|p| p.balance)
            .ok_or(InventoryError::ProductNotFound {
                product: product_id,
            })
    }

    /// Committed movements of one product, in commit (`sequence`) order.
    pub fn movements_for_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> InventoryResult<Vec<StockMovement>> {
        let state = self.read_state()?;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.tenant_id() == tenant_id && m.product_id() == product_id)
            .cloned()
            .collect())
    }

    /// Committed movements produced by one workflow line item.
    pub fn movements_for_source(
        &self,
        tenant_id: TenantId,
        source: SourceDocument,
    ) -> InventoryResult<Vec<StockMovement>> {
        let state = self.read_state()?;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.tenant_id() == tenant_id && m.source() == source)
            .cloned()
            .collect())
    }

    pub fn stock_entry(
        &self,
        tenant_id: TenantId,
        id: StockEntryId,
    ) -> InventoryResult<Option<StockEntry>> {
        Ok(self.read_state()?.entries.get(tenant_id, &id))
    }

    /// Stock entries of a tenant, newest first.
    pub fn list_stock_entries(&self, tenant_id: TenantId) -> InventoryResult<Vec<StockEntry>> {
        let mut entries = self.read_state()?.entries.list(tenant_id);
        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(entries)
    }

    pub fn stock_adjustment(
        &self,
        tenant_id: TenantId,
        id: StockAdjustmentId,
    ) -> InventoryResult<Option<StockAdjustment>> {
        Ok(self.read_state()?.adjustments.get(tenant_id, &id))
    }

    /// Stock adjustments of a tenant, newest first.
    pub fn list_stock_adjustments(
        &self,
        tenant_id: TenantId,
    ) -> InventoryResult<Vec<StockAdjustment>> {
        let mut adjustments = self.read_state()?.adjustments.list(tenant_id);
        adjustments.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(adjustments)
    }
}

impl AdjustmentTypeLookup for InventoryStore {
    fn find_adjustment_type(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> InventoryResult<Option<StockAdjustmentType>> {
        let state = self.read_state()?;
        Ok(resolve_adjustment_type(&state.adjustment_types, tenant_id, name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockflow_core::AggregateRoot;
    use stockflow_inventory::{AdjustmentDirection, AdjustmentTypeId};

    #[test]
    fn registered_product_exposes_its_opening_balance() {
        let store = InventoryStore::default();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        store
            .register_product(tenant, product, "Widget", Quantity::units(10))
            .unwrap();

        assert_eq!(store.balance(tenant, product).unwrap(), dec!(10));
        assert_eq!(
            store.balance(TenantId::new(), product).unwrap_err(),
            InventoryError::ProductNotFound { product }
        );
        assert!(store.movements_for_product(tenant, product).unwrap().is_empty());
    }

    #[test]
    fn duplicate_product_registration_is_a_conflict() {
        let store = InventoryStore::default();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        store
            .register_product(tenant, product, "Widget", Quantity::units(1))
            .unwrap();
        let err = store
            .register_product(tenant, product, "Widget", Quantity::units(1))
            .unwrap_err();
        assert!(matches!(err, InventoryError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn negative_opening_balance_is_rejected() {
        let store = InventoryStore::default();
        let err = store
            .register_product(TenantId::new(), ProductId::generate(), "Widget", Quantity::units(-1))
            .unwrap_err();
        assert!(matches!(err, InventoryError::InvalidQuantity(_)));
    }

    #[test]
    fn adjustment_type_names_are_unique_per_scope() {
        let store = InventoryStore::default();
        let tenant = TenantId::new();
        let make = |tenant_id, name: &str| {
            StockAdjustmentType::new(
                AdjustmentTypeId::generate(),
                tenant_id,
                name,
                "",
                AdjustmentDirection::Increase,
            )
            .unwrap()
        };

        store.register_adjustment_type(make(None, "FOUND")).unwrap();
        store.register_adjustment_type(make(Some(tenant), "found")).unwrap();
        assert!(store.register_adjustment_type(make(None, "Found")).is_err());

        let found = store.find_adjustment_type(tenant, "FOUND").unwrap().unwrap();
        assert_eq!(found.tenant_id(), Some(tenant));
        assert_eq!(store.adjustment_types(tenant).unwrap().len(), 2);
        assert_eq!(store.adjustment_types(TenantId::new()).unwrap().len(), 1);
    }

    #[test]
    fn dropped_transaction_leaves_no_trace() {
        let store = InventoryStore::default();
        let tenant = TenantId::new();
        let entry = StockEntry::draft(
            StockEntryId::generate(),
            tenant,
            stockflow_core::UserId::new(),
            None,
            None,
            None,
            chrono::Utc::now(),
        );
        {
            let mut tx = store.begin();
            tx.put_stock_entry(entry.clone(), stockflow_core::ExpectedVersion::Exact(0))
                .unwrap();
            assert!(tx.stock_entry(tenant, *entry.id()).unwrap().is_some());
        }
        assert!(store.stock_entry(tenant, *entry.id()).unwrap().is_none());
    }

    #[test]
    fn poisoned_state_surfaces_as_storage_error_from_type_lookup() {
        let store = InventoryStore::default();
        let tenant = TenantId::new();

        std::thread::scope(|scope| {
            let poisoner = scope.spawn(|| {
                let _state = store.write_state().unwrap();
                panic!("poison the inventory state");
            });
            assert!(poisoner.join().is_err());
        });

        assert!(matches!(
            store.find_adjustment_type(tenant, "FOUND"),
            Err(InventoryError::Storage(_))
        ));
    }
}

//! Inventory service: the transactional API consumed by order management.
//!
//! Every operation runs in exactly one transaction. It either commits fully or
//! has no effect: an error drops the transaction, which rolls back pending
//! balances, movements and header writes and releases every row lock.
//!
//! There is no retry inside the service. `InsufficientStock`, `LockTimeout` and
//! `Conflict` are reported to the caller, who decides whether to try again.

use std::sync::Arc;

use stockflow_core::{TenantId, UserId};
use stockflow_inventory::{
    AdjustmentDirection, AdjustmentTypeId, InventoryResult, MovementRequest, StockAdjustment,
    StockAdjustmentId, StockAdjustmentType, StockEntry, StockEntryId, StockMovement,
};

use crate::ledger;
use crate::store::{InventoryStore, Transaction};
use crate::workflows::{self, CreateStockAdjustment, CreateStockEntry};

#[derive(Debug, Clone)]
pub struct InventoryService {
    store: Arc<InventoryStore>,
}

impl InventoryService {
    pub fn new(store: Arc<InventoryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    /// Record a single movement directly (for workflows outside this crate).
    ///
    /// The returned row is the one built inside the transaction; its
    /// `sequence()` is stamped on the committed copy in the store.
    #[tracing::instrument(
        name = "inventory.record_movement",
        skip_all,
        fields(tenant_id = %request.tenant_id, product_id = %request.product_id)
    )]
    pub fn record_movement(&self, request: MovementRequest) -> InventoryResult<StockMovement> {
        self.in_transaction(|tx| ledger::record_movement(tx, request))
    }

    #[tracing::instrument(
        name = "inventory.create_stock_entry",
        skip_all,
        fields(tenant_id = %cmd.tenant_id, items = cmd.items.len(), status = %cmd.status)
    )]
    pub fn create_stock_entry(&self, cmd: CreateStockEntry) -> InventoryResult<StockEntry> {
        let entry = self.in_transaction(|tx| workflows::create_stock_entry(tx, cmd))?;
        tracing::info!(
            stock_entry_id = %entry.id_typed(),
            status = %entry.status(),
            "stock entry created"
        );
        Ok(entry)
    }

    #[tracing::instrument(
        name = "inventory.complete_stock_entry",
        skip_all,
        fields(tenant_id = %tenant_id, stock_entry_id = %id)
    )]
    pub fn complete_stock_entry(
        &self,
        tenant_id: TenantId,
        id: StockEntryId,
        user_id: UserId,
    ) -> InventoryResult<StockEntry> {
        let entry =
            self.in_transaction(|tx| workflows::complete_stock_entry(tx, tenant_id, id, user_id))?;
        tracing::info!(items = entry.items().len(), "stock entry completed");
        Ok(entry)
    }

    #[tracing::instrument(
        name = "inventory.create_stock_adjustment",
        skip_all,
        fields(tenant_id = %cmd.tenant_id, items = cmd.items.len(), status = %cmd.status)
    )]
    pub fn create_stock_adjustment(
        &self,
        cmd: CreateStockAdjustment,
    ) -> InventoryResult<StockAdjustment> {
        let adjustment = self.in_transaction(|tx| workflows::create_stock_adjustment(tx, cmd))?;
        tracing::info!(
            stock_adjustment_id = %adjustment.id_typed(),
            status = %adjustment.status(),
            "stock adjustment created"
        );
        Ok(adjustment)
    }

    #[tracing::instrument(
        name = "inventory.complete_stock_adjustment",
        skip_all,
        fields(tenant_id = %tenant_id, stock_adjustment_id = %id)
    )]
    pub fn complete_stock_adjustment(
        &self,
        tenant_id: TenantId,
        id: StockAdjustmentId,
        user_id: UserId,
    ) -> InventoryResult<StockAdjustment> {
        let adjustment = self.in_transaction(|tx| {
            workflows::complete_stock_adjustment(tx, tenant_id, id, user_id)
        })?;
        tracing::info!(items = adjustment.items().len(), "stock adjustment completed");
        Ok(adjustment)
    }

    /// Register an adjustment type; `tenant_id == None` makes it global.
    pub fn register_adjustment_type(
        &self,
        tenant_id: Option<TenantId>,
        name: &str,
        label: &str,
        direction: AdjustmentDirection,
    ) -> InventoryResult<StockAdjustmentType> {
        let adjustment_type = StockAdjustmentType::new(
            AdjustmentTypeId::generate(),
            tenant_id,
            name,
            label,
            direction,
        )?;
        self.store.register_adjustment_type(adjustment_type.clone())?;
        tracing::info!(
            name = adjustment_type.name(),
            global = adjustment_type.is_global(),
            "adjustment type registered"
        );
        Ok(adjustment_type)
    }

    fn in_transaction<T>(
        &self,
        op: impl FnOnce(&mut Transaction<'_>) -> InventoryResult<T>,
    ) -> InventoryResult<T> {
        let mut tx = self.store.begin();
        match op(&mut tx) {
            Ok(out) => {
                tx.commit()?;
                Ok(out)
            }
            Err(err) => {
                tracing::debug!(tx = ?tx.id(), error = %err, "rolling back");
                Err(err)
            }
        }
    }
}

use chrono::Utc;

use stockflow_core::{AggregateRoot, ExpectedVersion, TenantId, UserId};
use stockflow_inventory::{
    DocumentStatus, InventoryError, InventoryResult, NewStockAdjustmentItem, StockAdjustment,
    StockAdjustmentId,
};

use crate::ledger;
use crate::store::Transaction;

/// Input of [`create_stock_adjustment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStockAdjustment {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub items: Vec<NewStockAdjustmentItem>,
    pub status: DocumentStatus,
    pub notes: Option<String>,
}

impl CreateStockAdjustment {
    pub fn draft(tenant_id: TenantId, user_id: UserId, items: Vec<NewStockAdjustmentItem>) -> Self {
        Self {
            tenant_id,
            user_id,
            items,
            status: DocumentStatus::Draft,
            notes: None,
        }
    }

    pub fn completed(
        tenant_id: TenantId,
        user_id: UserId,
        items: Vec<NewStockAdjustmentItem>,
    ) -> Self {
        Self {
            status: DocumentStatus::Completed,
            ..Self::draft(tenant_id, user_id, items)
        }
    }
}

/// Persist a stock adjustment with its items, completing it when requested.
///
/// Same policy as stock entries: written as DRAFT with all items, then
/// completed in one pass when COMPLETED was requested.
pub fn create_stock_adjustment(
    tx: &mut Transaction<'_>,
    cmd: CreateStockAdjustment,
) -> InventoryResult<StockAdjustment> {
    let mut adjustment = StockAdjustment::draft(
        StockAdjustmentId::generate(),
        cmd.tenant_id,
        cmd.user_id,
        cmd.notes,
        Utc::now(),
    );

    for item in cmd.items {
        if !tx.product_exists(cmd.tenant_id, item.product_id)? {
            return Err(InventoryError::ProductNotFound {
                product: item.product_id,
            });
        }
        adjustment.add_item(item, &*tx)?;
    }
    tx.put_stock_adjustment(adjustment.clone(), ExpectedVersion::Exact(0))?;

    match cmd.status {
        DocumentStatus::Draft => Ok(adjustment),
        DocumentStatus::Completed => complete(tx, adjustment, cmd.user_id),
    }
}

/// Complete a DRAFT stock adjustment; each item's direction comes from its
/// adjustment type.
pub fn complete_stock_adjustment(
    tx: &mut Transaction<'_>,
    tenant_id: TenantId,
    id: StockAdjustmentId,
    user_id: UserId,
) -> InventoryResult<StockAdjustment> {
    let adjustment = tx
        .stock_adjustment(tenant_id, id)?
        .ok_or_else(|| InventoryError::DocumentNotFound(format!("stock adjustment {id}")))?;
    complete(tx, adjustment, user_id)
}

fn complete(
    tx: &mut Transaction<'_>,
    mut adjustment: StockAdjustment,
    user_id: UserId,
) -> InventoryResult<StockAdjustment> {
    adjustment.ensure_draft()?;
    let expected = ExpectedVersion::Exact(adjustment.version());

    let requests = adjustment.movement_requests(user_id, &*tx)?;
    for request in requests {
        ledger::record_movement(tx, request)?;
    }

    adjustment.mark_completed(Utc::now())?;
    tx.put_stock_adjustment(adjustment.clone(), expected)?;
    Ok(adjustment)
}

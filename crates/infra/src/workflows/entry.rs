use chrono::Utc;

use stockflow_core::{AggregateId, AggregateRoot, ExpectedVersion, TenantId, UserId};
use stockflow_inventory::{
    DocumentStatus, InventoryError, InventoryResult, NewStockEntryItem, StockEntry, StockEntryId,
};

use crate::ledger;
use crate::store::Transaction;

/// Input of [`create_stock_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStockEntry {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub items: Vec<NewStockEntryItem>,
    pub purchase_order_id: Option<AggregateId>,
    pub supplier_id: Option<AggregateId>,
    /// Requested outcome; `Completed` completes the entry in the same transaction.
    pub status: DocumentStatus,
    pub notes: Option<String>,
}

impl CreateStockEntry {
    pub fn draft(tenant_id: TenantId, user_id: UserId, items: Vec<NewStockEntryItem>) -> Self {
        Self {
            tenant_id,
            user_id,
            items,
            purchase_order_id: None,
            supplier_id: None,
            status: DocumentStatus::Draft,
            notes: None,
        }
    }
}

/// Persist a stock entry with its items, completing it when requested.
///
/// The header is always written as DRAFT with every item attached first; a
/// COMPLETED request then runs the regular completion over all items.
pub fn create_stock_entry(
    tx: &mut Transaction<'_>,
    cmd: CreateStockEntry,
) -> InventoryResult<StockEntry> {
    let mut entry = StockEntry::draft(
        StockEntryId::generate(),
        cmd.tenant_id,
        cmd.user_id,
        cmd.purchase_order_id,
        cmd.supplier_id,
        cmd.notes,
        Utc::now(),
    );

    for item in cmd.items {
        if !tx.product_exists(cmd.tenant_id, item.product_id)? {
            return Err(InventoryError::ProductNotFound {
                product: item.product_id,
            });
        }
        entry.add_item(item)?;
    }
    tx.put_stock_entry(entry.clone(), ExpectedVersion::Exact(0))?;

    match cmd.status {
        DocumentStatus::Draft => Ok(entry),
        DocumentStatus::Completed => complete(tx, entry, cmd.user_id),
    }
}

/// Complete a DRAFT stock entry: one IN movement per item, in item order.
pub fn complete_stock_entry(
    tx: &mut Transaction<'_>,
    tenant_id: TenantId,
    id: StockEntryId,
    user_id: UserId,
) -> InventoryResult<StockEntry> {
    let entry = tx
        .stock_entry(tenant_id, id)?
        .ok_or_else(|| InventoryError::DocumentNotFound(format!("stock entry {id}")))?;
    complete(tx, entry, user_id)
}

fn complete(
    tx: &mut Transaction<'_>,
    mut entry: StockEntry,
    user_id: UserId,
) -> InventoryResult<StockEntry> {
    entry.ensure_draft()?;
    let expected = ExpectedVersion::Exact(entry.version());

    for request in entry.movement_requests(user_id) {
        ledger::record_movement(tx, request)?;
    }

    entry.mark_completed(Utc::now())?;
    tx.put_stock_entry(entry.clone(), expected)?;
    Ok(entry)
}

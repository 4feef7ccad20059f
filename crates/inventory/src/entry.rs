//! Stock entries: incoming stock (typically received against a purchase order).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{AggregateId, AggregateRoot, TenantId, UserId};

use crate::error::InventoryError;
use crate::ids::{ProductId, StockEntryId, StockEntryItemId};
use crate::movement::{MovementDirection, MovementRequest, SourceDocument};
use crate::quantity::{Quantity, UnitPrice};
use crate::status::DocumentStatus;

/// Line item as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockEntryItem {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
    pub expiration_date: Option<NaiveDate>,
}

/// Persisted line item of a stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntryItem {
    pub id: StockEntryItemId,
    /// 1-based insertion order; movements are applied in this order.
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: UnitPrice,
    pub expiration_date: Option<NaiveDate>,
}

/// Aggregate root: StockEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    id: StockEntryId,
    tenant_id: TenantId,
    purchase_order_id: Option<AggregateId>,
    supplier_id: Option<AggregateId>,
    status: DocumentStatus,
    notes: Option<String>,
    user_id: UserId,
    items: Vec<StockEntryItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl StockEntry {
    /// A new draft with no items (version 1 once persisted).
    pub fn draft(
        id: StockEntryId,
        tenant_id: TenantId,
        user_id: UserId,
        purchase_order_id: Option<AggregateId>,
        supplier_id: Option<AggregateId>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            purchase_order_id,
            supplier_id,
            status: DocumentStatus::Draft,
            notes,
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn id_typed(&self) -> StockEntryId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn purchase_order_id(&self) -> Option<AggregateId> {
        self.purchase_order_id
    }

    pub fn supplier_id(&self) -> Option<AggregateId> {
        self.supplier_id
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[StockEntryItem] {
        &self.items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn ensure_draft(&self) -> Result<(), InventoryError> {
        if self.status.is_draft() {
            return Ok(());
        }
        Err(InventoryError::InvalidTransition {
            document: format!("stock entry {}", self.id),
            status: self.status,
        })
    }

    /// Attach a line item. Only drafts accept items.
    pub fn add_item(&mut self, item: NewStockEntryItem) -> Result<&StockEntryItem, InventoryError> {
        self.ensure_draft()?;
        if !item.quantity.is_positive() {
            return Err(InventoryError::InvalidQuantity(item.quantity.value()));
        }

        let line_no = self.items.len() as u32 + 1;
        self.items.push(StockEntryItem {
            id: StockEntryItemId::generate(),
            line_no,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            expiration_date: item.expiration_date,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// One IN movement per item, in line order.
    pub fn movement_requests(&self, user_id: UserId) -> Vec<MovementRequest> {
        self.items
            .iter()
            .map(|item| MovementRequest {
                tenant_id: self.tenant_id,
                product_id: item.product_id,
                direction: MovementDirection::In,
                quantity: item.quantity,
                source: SourceDocument::StockEntryItem(item.id),
                user_id,
                unit_price: Some(item.unit_price),
                notes: Some(format!(
                    "Stock entry #{} - product {}",
                    self.id, item.product_id
                )),
            })
            .collect()
    }

    /// Flip to COMPLETED. The movements must already be recorded in the same
    /// transaction.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), InventoryError> {
        self.ensure_draft()?;
        self.status = DocumentStatus::Completed;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for StockEntry {
    type Id = StockEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

//! Stock adjustments: ad-hoc corrections whose direction comes from a
//! configurable adjustment type.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{AggregateRoot, DomainError, DomainResult, TenantId, UserId};

use crate::error::{InventoryError, InventoryResult};
use crate::ids::{AdjustmentTypeId, ProductId, StockAdjustmentId, StockAdjustmentItemId};
use crate::movement::{MovementDirection, MovementRequest, SourceDocument};
use crate::quantity::Quantity;
use crate::status::DocumentStatus;

/// Fixed direction of an adjustment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentDirection {
    #[serde(rename = "IN")]
    Increase,
    #[serde(rename = "OUT")]
    Decrease,
}

impl AdjustmentDirection {
    pub fn movement_direction(self) -> MovementDirection {
        match self {
            AdjustmentDirection::Increase => MovementDirection::In,
            AdjustmentDirection::Decrease => MovementDirection::Out,
        }
    }
}

impl From<AdjustmentDirection> for MovementDirection {
    fn from(value: AdjustmentDirection) -> Self {
        value.movement_direction()
    }
}

impl FromStr for AdjustmentDirection {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<MovementDirection>()? {
            MovementDirection::In => Ok(AdjustmentDirection::Increase),
            MovementDirection::Out => Ok(AdjustmentDirection::Decrease),
        }
    }
}

/// Named lookup fixing the direction of adjustment lines.
///
/// `tenant_id == None` marks a global type, visible to every tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustmentType {
    id: AdjustmentTypeId,
    tenant_id: Option<TenantId>,
    name: String,
    label: String,
    direction: AdjustmentDirection,
}

impl StockAdjustmentType {
    pub fn new(
        id: AdjustmentTypeId,
        tenant_id: Option<TenantId>,
        name: impl Into<String>,
        label: impl Into<String>,
        direction: AdjustmentDirection,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("adjustment type name cannot be empty"));
        }
        let label = label.into();
        let label = if label.trim().is_empty() {
            name.clone()
        } else {
            label
        };

        Ok(Self {
            id,
            tenant_id,
            name,
            label,
            direction,
        })
    }

    pub fn id(&self) -> AdjustmentTypeId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_global(&self) -> bool {
        self.tenant_id.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn direction(&self) -> AdjustmentDirection {
        self.direction
    }

    /// Case-insensitive name match.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Whether `tenant_id` can see this type.
    pub fn visible_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id.is_none_or(|t| t == tenant_id)
    }
}

/// Resolve `name` for `tenant_id`: a tenant-scoped type shadows a global one.
pub fn resolve_adjustment_type<'a>(
    candidates: impl IntoIterator<Item = &'a StockAdjustmentType>,
    tenant_id: TenantId,
    name: &str,
) -> Option<&'a StockAdjustmentType> {
    let mut global = None;
    for candidate in candidates {
        if !candidate.has_name(name) || !candidate.visible_to(tenant_id) {
            continue;
        }
        if !candidate.is_global() {
            return Some(candidate);
        }
        global = global.or(Some(candidate));
    }
    global
}

/// Source of adjustment types, consulted when an adjustment is created or completed.
///
/// `Ok(None)` means no type resolves; `Err` means the source itself failed.
pub trait AdjustmentTypeLookup {
    fn find_adjustment_type(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> InventoryResult<Option<StockAdjustmentType>>;
}

/// Line item as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStockAdjustmentItem {
    pub product_id: ProductId,
    /// Adjustment type name, resolved through [`AdjustmentTypeLookup`].
    pub adjustment_type: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustmentItem {
    pub id: StockAdjustmentItemId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub adjustment_type: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

/// Aggregate root: StockAdjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    id: StockAdjustmentId,
    tenant_id: TenantId,
    status: DocumentStatus,
    notes: Option<String>,
    user_id: UserId,
    items: Vec<StockAdjustmentItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl StockAdjustment {
    pub fn draft(
        id: StockAdjustmentId,
        tenant_id: TenantId,
        user_id: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            status: DocumentStatus::Draft,
            notes,
            user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn id_typed(&self) -> StockAdjustmentId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
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

    pub fn items(&self) -> &[StockAdjustmentItem] {
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
            document: format!("stock adjustment {}", self.id),
            status: self.status,
        })
    }

    /// Attach a line item; its adjustment type must resolve for this tenant.
    pub fn add_item(
        &mut self,
        item: NewStockAdjustmentItem,
        types: &impl AdjustmentTypeLookup,
    ) -> Result<&StockAdjustmentItem, InventoryError> {
        self.ensure_draft()?;
        if !item.quantity.is_positive() {
            return Err(InventoryError::InvalidQuantity(item.quantity.value()));
        }
        let adjustment_type = types
            .find_adjustment_type(self.tenant_id, &item.adjustment_type)?
            .ok_or_else(|| InventoryError::AdjustmentTypeNotFound {
                name: item.adjustment_type.clone(),
            })?;

        let line_no = self.items.len() as u32 + 1;
        self.items.push(StockAdjustmentItem {
            id: StockAdjustmentItemId::generate(),
            line_no,
            product_id: item.product_id,
            adjustment_type: adjustment_type.name().to_string(),
            quantity: item.quantity,
            notes: item.notes,
        });
        Ok(&self.items[self.items.len() - 1])
    }

    /// One movement per item, in line order, direction taken from each item's
    /// adjustment type as it resolves now.
    pub fn movement_requests(
        &self,
        user_id: UserId,
        types: &impl AdjustmentTypeLookup,
    ) -> Result<Vec<MovementRequest>, InventoryError> {
        self.items
            .iter()
            .map(|item| {
                let adjustment_type = types
                    .find_adjustment_type(self.tenant_id, &item.adjustment_type)?
                    .ok_or_else(|| InventoryError::AdjustmentTypeNotFound {
                        name: item.adjustment_type.clone(),
                    })?;

                let notes = item.notes.clone().unwrap_or_else(|| {
                    format!("Stock adjustment #{} - product {}", self.id, item.product_id)
                });

                Ok(MovementRequest {
                    tenant_id: self.tenant_id,
                    product_id: item.product_id,
                    direction: adjustment_type.direction().movement_direction(),
                    quantity: item.quantity,
                    source: SourceDocument::StockAdjustmentItem(item.id),
                    user_id,
                    unit_price: None,
                    notes: Some(notes),
                })
            })
            .collect()
    }

    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), InventoryError> {
        self.ensure_draft()?;
        self.status = DocumentStatus::Completed;
        self.updated_at = now;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for StockAdjustment {
    type Id = StockAdjustmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

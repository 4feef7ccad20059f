//! Stock movements: the append-only ledger rows and the balance rule.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockflow_core::{AggregateId, TenantId, UserId};

use crate::error::InventoryError;
use crate::ids::{ProductId, StockAdjustmentItemId, StockEntryItemId, StockMovementId};
use crate::quantity::{MAX_QUANTITY, Quantity, UnitPrice};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementDirection {
    /// Increases the balance.
    In,
    /// Decreases the balance, bounded by the current balance.
    Out,
}

impl MovementDirection {
    pub fn code(self) -> &'static str {
        match self {
            MovementDirection::In => "IN",
            MovementDirection::Out => "OUT",
        }
    }

    /// Quantity with the sign this direction applies to a balance.
    pub fn signed(self, quantity: Quantity) -> Decimal {
        match self {
            MovementDirection::In => quantity.value(),
            MovementDirection::Out => -quantity.value(),
        }
    }
}

impl FromStr for MovementDirection {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(MovementDirection::In),
            "OUT" => Ok(MovementDirection::Out),
            other => Err(InventoryError::InvalidDirection(other.to_string())),
        }
    }
}

impl core::fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// The workflow line item a movement originated from.
///
/// Serialized as `{"kind": "stock_entry_item", "id": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SourceDocument {
    StockEntryItem(StockEntryItemId),
    StockAdjustmentItem(StockAdjustmentItemId),
}

impl SourceDocument {
    /// Stable provenance tag.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceDocument::StockEntryItem(_) => "stock_entry_item",
            SourceDocument::StockAdjustmentItem(_) => "stock_adjustment_item",
        }
    }

    pub fn id(&self) -> AggregateId {
        match self {
            SourceDocument::StockEntryItem(id) => id.0,
            SourceDocument::StockAdjustmentItem(id) => id.0,
        }
    }
}

impl core::fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Everything the ledger writer needs to record one movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub direction: MovementDirection,
    pub quantity: Quantity,
    pub source: SourceDocument,
    pub user_id: UserId,
    pub unit_price: Option<UnitPrice>,
    pub notes: Option<String>,
}

impl MovementRequest {
    /// Checks that do not need the product balance.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if !self.quantity.is_positive() {
            return Err(InventoryError::InvalidQuantity(self.quantity.value()));
        }
        Ok(())
    }
}

/// Apply one movement to a balance.
///
/// Returns the balance after the movement, or the reason the movement is not
/// allowed. The caller must hold the product's balance exclusively while the
/// result is written back.
pub fn apply_movement(
    product: ProductId,
    balance: Decimal,
    direction: MovementDirection,
    quantity: Quantity,
) -> Result<Decimal, InventoryError> {
    if !quantity.is_positive() {
        return Err(InventoryError::InvalidQuantity(quantity.value()));
    }

    match direction {
        MovementDirection::In => balance
            .checked_add(quantity.value())
            .filter(|next| *next <= MAX_QUANTITY)
            .ok_or(InventoryError::BalanceOverflow {
                product,
                available: balance,
                requested: quantity.value(),
            }),
        MovementDirection::Out => {
            if balance < quantity.value() {
                return Err(InventoryError::InsufficientStock {
                    product,
                    available: balance,
                    requested: quantity.value(),
                });
            }
            Ok(balance - quantity.value())
        }
    }
}

/// Immutable ledger row: one quantity change and the balance it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: StockMovementId,
    tenant_id: TenantId,
    product_id: ProductId,
    direction: MovementDirection,
    quantity: Quantity,
    new_stock: Decimal,
    unit_price: Option<UnitPrice>,
    source: SourceDocument,
    user_id: UserId,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    /// Commit ordinal within the store; 0 until the owning transaction commits.
    sequence: u64,
}

impl StockMovement {
    /// Build the ledger row for `request` against the current (locked) `balance`.
    pub fn record(
        id: StockMovementId,
        request: MovementRequest,
        balance: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self, InventoryError> {
        let new_stock = apply_movement(
            request.product_id,
            balance,
            request.direction,
            request.quantity,
        )?;

        Ok(Self {
            id,
            tenant_id: request.tenant_id,
            product_id: request.product_id,
            direction: request.direction,
            quantity: request.quantity,
            new_stock,
            unit_price: request.unit_price,
            source: request.source,
            user_id: request.user_id,
            notes: request.notes,
            created_at,
            sequence: 0,
        })
    }

    /// Stamp the commit ordinal. Called by the store while publishing the row.
    pub fn assign_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    pub fn id(&self) -> StockMovementId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn direction(&self) -> MovementDirection {
        self.direction
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Balance snapshot taken immediately after this movement.
    pub fn new_stock(&self) -> Decimal {
        self.new_stock
    }

    /// Balance immediately before this movement.
    pub fn previous_stock(&self) -> Decimal {
        self.new_stock - self.direction.signed(self.quantity)
    }

    pub fn unit_price(&self) -> Option<UnitPrice> {
        self.unit_price
    }

    pub fn source(&self) -> SourceDocument {
        self.source
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Orders movements that share a `created_at`.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

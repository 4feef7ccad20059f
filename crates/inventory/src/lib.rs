//! Inventory domain module.
//!
//! Business rules for the stock-movement ledger and the two workflows that feed
//! it (stock entries and stock adjustments), implemented as deterministic domain
//! logic (no IO, no locking, no storage). Transactions and persistence live in
//! `stockflow-infra`.

pub mod adjustment;
pub mod entry;
pub mod error;
pub mod ids;
pub mod movement;
pub mod quantity;
pub mod status;

pub use adjustment::{
    AdjustmentDirection, AdjustmentTypeLookup, NewStockAdjustmentItem, StockAdjustment,
    StockAdjustmentItem, StockAdjustmentType, resolve_adjustment_type,
};
pub use entry::{NewStockEntryItem, StockEntry, StockEntryItem};
pub use error::{InventoryError, InventoryResult};
pub use ids::{
    AdjustmentTypeId, ProductId, StockAdjustmentId, StockAdjustmentItemId, StockEntryId,
    StockEntryItemId, StockMovementId,
};
pub use movement::{
    MovementDirection, MovementRequest, SourceDocument, StockMovement, apply_movement,
};
pub use quantity::{MAX_QUANTITY, Quantity, UnitPrice};
pub use status::DocumentStatus;

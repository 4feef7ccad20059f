//! Typed identifiers for inventory records.
//!
//! Every id wraps an `AggregateId`; tenant scoping is carried alongside the id
//! (in the record or the lookup key), never inside it.

use serde::{Deserialize, Serialize};

use stockflow_core::AggregateId;

macro_rules! inventory_id {
    ($(#[$meta:meta])* $t:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(pub AggregateId);

        impl $t {
            /// Fresh time-ordered identifier.
            pub fn generate() -> Self {
                Self(AggregateId::new())
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

inventory_id!(
    /// Product identifier (the product row itself is owned by the catalog).
    ProductId
);
inventory_id!(
    /// Ledger row identifier.
    StockMovementId
);
inventory_id!(StockEntryId);
inventory_id!(StockEntryItemId);
inventory_id!(StockAdjustmentId);
inventory_id!(StockAdjustmentItemId);
inventory_id!(AdjustmentTypeId);

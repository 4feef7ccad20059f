//! Stock workflows: draft documents whose completion drives the ledger.
//!
//! Both workflows share one rule: a DRAFT header never has movements, a
//! COMPLETED header has exactly one movement per item, and the status flip
//! commits together with all of them. Functions here run inside a caller-owned
//! [`Transaction`](crate::store::Transaction); they never commit.

pub mod adjustment;
pub mod entry;

pub use adjustment::{CreateStockAdjustment, complete_stock_adjustment, create_stock_adjustment};
pub use entry::{CreateStockEntry, complete_stock_entry, create_stock_entry};

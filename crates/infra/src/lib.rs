//! Infrastructure layer: storage, transactions and the transactional
//! inventory services built on top of the pure domain crates.

pub mod config;
pub mod ledger;
pub mod service;
pub mod store;
pub mod workflows;


pub use config::InventoryConfig;
pub use service::InventoryService;
pub use store::{InventoryStore, ProductStock, Transaction};

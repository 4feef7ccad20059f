//! `stockflow-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by the inventory crates: identifiers, the
//! domain error model and optimistic-concurrency helpers. No IO lives here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};

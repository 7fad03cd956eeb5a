//! Resource module
//!
//! The dashboard lists three structurally identical resources: products,
//! admin users and contact inquiries. This module names them, maps them to
//! their API paths and carries the filter context that keys the page cache.

mod records;
mod types;

pub use records::{AdminRole, AdminUser, ContactInquiry, Product};
pub use types::{FilterContext, ResourceKind, ResourceSpec};

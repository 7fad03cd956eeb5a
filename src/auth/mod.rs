//! Authentication module
//!
//! Supports: Bearer token
//!
//! Tokens are issued elsewhere (the dashboard's login flow) and consumed here
//! as opaque strings. Each resource decides whether its requests carry them.

mod authenticator;

pub use authenticator::{AuthConfig, Authenticator};

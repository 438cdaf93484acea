//! Credential model shared by the store, refresh, and interceptor layers.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;

//! Backend transport: the two outbound HTTP calls of the intake wizards.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{BackendClient, BackendError};

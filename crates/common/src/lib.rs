//! Common types for the CustomAPI gateway
//!
//! Shared by the auth crate, the client crate and the gateway binary:
//! the redacting `Secret` wrapper, the nine configuration inputs
//! (`Settings`) and the configuration error type.

mod error;
mod secret;
pub mod settings;

pub use error::{Error, Result};
pub use secret::Secret;
pub use settings::Settings;

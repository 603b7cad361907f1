//! CustomAPI OAuth authentication library
//!
//! Obtains and caches bearer tokens for the CustomAPI REST API. This crate is
//! a standalone library with no dependency on the request proxy, so it can be
//! tested and used on its own.
//!
//! Token flow:
//! 1. Host builds `Credentials` once at startup (`Credentials::from_settings`)
//! 2. `TokenManager::get_token()` returns a static token untouched, or the
//!    cached password-grant token while it is still valid
//! 3. On a cold or expired cache, one caller performs the password grant via
//!    `token::request_password_grant()`; concurrent callers wait and reuse it
//! 4. `TokenManager::invalidate()` clears the cache so the next call re-authenticates

pub mod constants;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod manager;
pub mod token;

pub use constants::*;
pub use credentials::{Credentials, PasswordGrant};
pub use environment::{Environment, token_url};
pub use error::{Error, Result};
pub use manager::TokenManager;
pub use token::{TokenResponse, request_password_grant};

//! # oc-auth
//!
//! Request identity extraction for the two authentication modes the router
//! accepts:
//!
//! - **Bearer JWT**: identity read from an already-validated token's payload
//!   ([`jwt::identity_from_bearer`]). No signature verification happens here.
//! - **Long-lived API key**: `oc_`-prefixed keys, hashed before storage or
//!   lookup ([`api_key`]). The actual lookup against persisted records lives
//!   in `oc-store`; this crate only covers generation, hashing, and constants.

#![deny(unsafe_code)]

pub mod api_key;
pub mod errors;
pub mod jwt;

pub use errors::AuthError;
pub use jwt::{JwtClaims, JwtIdentity, identity_from_bearer};

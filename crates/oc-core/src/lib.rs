//! # oc-core
//!
//! Foundation types shared by every layer of the router:
//!
//! - **Error envelope**: [`error::AppError`], the single error hierarchy with
//!   one fixed mapping to HTTP status and the uniform JSON error body.
//! - **Canonical message**: the Converse-shaped message model the translator
//!   produces and consumes.
//! - **Client version comparison**: the lexicographic `(major, minor, patch)`
//!   parser used by the version gate.

#![deny(unsafe_code)]

pub mod error;
pub mod message;
pub mod version;

pub use error::AppError;

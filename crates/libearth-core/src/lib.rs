//! libearth core: shared error type and definitions.
//!
//! This crate has no internal libearth dependencies (dependency level 0).
//! Every other crate in the workspace reports failures through its
//! [`Error`] type.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias

pub mod error;

pub use error::{Error, Result};

/// Version of the libearth crates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

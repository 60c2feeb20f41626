//! libearth, the shared common library for Earth Reader apps.
//!
//! This crate re-exports all libearth components for convenience.
//! Use feature flags to enable specific functionality:
//!
//! - `repository` (default): storage repositories
//! - `cli`: the `earth` command-line front end as a library

pub use libearth_core as core;
pub use libearth_schema as schema;

pub use libearth_core::{Error, Result, VERSION};

#[cfg(feature = "repository")]
pub use libearth_repository as repository;

#[cfg(feature = "cli")]
pub use libearth_cli as cli;

//! Namespace migration support for DA clients.
//!
//! A chain that changed its DA namespaces keeps its old blobs under the old
//! namespaces. [`MigrationRegistry`] records which namespaces were in effect up
//! to which height, and [`NamespaceMigrationDa`] wraps any [`da_interface::DaApi`]
//! so sync and submission code can keep using the current namespaces only.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod adapter;
mod config;
mod migrations;
mod registry;

pub use adapter::NamespaceMigrationDa;
pub use config::*;
pub use migrations::*;
pub use registry::*;

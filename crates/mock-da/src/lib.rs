//! In memory implementation of [`da_interface::DaApi`] for tests and demos.

#![deny(missing_docs)]

mod service;
mod store;

pub use service::*;

//! This crate defines the types and the client trait used by a node to talk to
//! the data availability layer. Blobs, ids, proofs and commitments are opaque
//! byte strings; the only structured value is the [`Namespace`] under which
//! blobs are stored.

#![deny(missing_docs)]

mod da;
mod error;
mod namespace;

pub use da::*;
pub use error::DaError;
pub use namespace::*;
pub use tokio_util::sync::CancellationToken;

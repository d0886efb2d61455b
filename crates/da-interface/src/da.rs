//! The da module defines the trait used by the node to interact with the DA layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{DaError, Namespace};

/// Opaque identifier of a blob on the DA layer.
pub type ID = Vec<u8>;
/// Opaque blob payload.
pub type Blob = Vec<u8>;
/// Commitment to a blob, as computed by the DA layer.
pub type Commitment = Vec<u8>;
/// Inclusion proof of a blob.
pub type Proof = Vec<u8>;

/// Size of the height prefix in ids produced by [`make_id`].
pub const ID_HEIGHT_SIZE: usize = 8;

/// Result of [`DaApi::get_ids`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetIdsResult {
    /// Ids of all blobs found at the height, in submission order.
    pub ids: Vec<ID>,
    /// Timestamp of the DA block at that height.
    pub timestamp: DateTime<Utc>,
}

/// Builds a blob id out of the DA height and the blob commitment.
pub fn make_id(height: u64, commitment: &[u8]) -> ID {
    let mut id = Vec::with_capacity(ID_HEIGHT_SIZE + commitment.len());
    id.extend_from_slice(&height.to_le_bytes());
    id.extend_from_slice(commitment);
    id
}

/// Splits a blob id built by [`make_id`] back into height and commitment.
pub fn split_id(id: &[u8]) -> Result<(u64, &[u8]), DaError> {
    if id.len() <= ID_HEIGHT_SIZE {
        return Err(DaError::InvalidId(format!(
            "id of {} bytes has no commitment",
            id.len()
        )));
    }
    let (height, commitment) = id.split_at(ID_HEIGHT_SIZE);
    let mut height_bytes = [0u8; ID_HEIGHT_SIZE];
    height_bytes.copy_from_slice(height);
    Ok((u64::from_le_bytes(height_bytes), commitment))
}

/// A DaApi is the local side of an RPC connection talking to a node of the DA layer.
///
/// Every call carries the caller's cancellation context. Implementations return
/// [`DaError::Cancelled`] once the context is cancelled instead of completing the call.
/// Implementations must be safe to share between concurrent callers.
#[async_trait::async_trait]
pub trait DaApi: Send + Sync {
    /// Returns ids of all blobs located in the DA layer at the given height, under `namespace`.
    async fn get_ids(
        &self,
        ctx: &CancellationToken,
        height: u64,
        namespace: &Namespace,
    ) -> Result<GetIdsResult, DaError>;

    /// Fetches blobs by id. Fails if any of them is missing under `namespace`.
    async fn get(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Blob>, DaError>;

    /// Fetches inclusion proofs of the blobs with the given ids.
    async fn get_proofs(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Proof>, DaError>;

    /// Checks each proof against the blob id it was produced for.
    async fn validate(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        namespace: &Namespace,
    ) -> Result<Vec<bool>, DaError>;

    /// Submits blobs and returns their ids.
    async fn submit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
    ) -> Result<Vec<ID>, DaError>;

    /// Submits blobs with implementation specific options (e.g. signer address).
    async fn submit_with_options(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
        options: &[u8],
    ) -> Result<Vec<ID>, DaError>;

    /// Computes commitments of blobs without submitting them.
    async fn commit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        namespace: &Namespace,
    ) -> Result<Vec<Commitment>, DaError>;
}

#[async_trait::async_trait]
impl<T: DaApi + ?Sized> DaApi for Arc<T> {
    async fn get_ids(
        &self,
        ctx: &CancellationToken,
        height: u64,
        namespace: &Namespace,
    ) -> Result<GetIdsResult, DaError> {
        (**self).get_ids(ctx, height, namespace).await
    }

    async fn get(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Blob>, DaError> {
        (**self).get(ctx, ids, namespace).await
    }

    async fn get_proofs(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Proof>, DaError> {
        (**self).get_proofs(ctx, ids, namespace).await
    }

    async fn validate(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        namespace: &Namespace,
    ) -> Result<Vec<bool>, DaError> {
        (**self).validate(ctx, ids, proofs, namespace).await
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
    ) -> Result<Vec<ID>, DaError> {
        (**self).submit(ctx, blobs, gas_price, namespace).await
    }

    async fn submit_with_options(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
        options: &[u8],
    ) -> Result<Vec<ID>, DaError> {
        (**self)
            .submit_with_options(ctx, blobs, gas_price, namespace, options)
            .await
    }

    async fn commit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        namespace: &Namespace,
    ) -> Result<Vec<Commitment>, DaError> {
        (**self).commit(ctx, blobs, namespace).await
    }
}

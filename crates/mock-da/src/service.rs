use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use da_interface::{
    split_id, Blob, CancellationToken, Commitment, DaApi, DaError, GetIdsResult, Namespace,
    Proof, ID,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::store::{commitment, BlockStore};

/// Default blob size limit, 1.5 MiB.
pub const DEFAULT_MAX_BLOB_SIZE: usize = 1_572_864;

/// The configuration for mock da
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MockDaConfig {
    /// Largest blob accepted by `submit`
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: usize,
}

impl Default for MockDaConfig {
    fn default() -> Self {
        Self {
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
        }
    }
}

#[inline]
const fn default_max_blob_size() -> usize {
    DEFAULT_MAX_BLOB_SIZE
}

/// Operations of [`DaApi`], as recorded by [`MockDaService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockDaMethod {
    /// [`DaApi::get_ids`]
    GetIds,
    /// [`DaApi::get`]
    Get,
    /// [`DaApi::get_proofs`]
    GetProofs,
    /// [`DaApi::validate`]
    Validate,
    /// [`DaApi::submit`]
    Submit,
    /// [`DaApi::submit_with_options`]
    SubmitWithOptions,
    /// [`DaApi::commit`]
    Commit,
}

/// A call received by [`MockDaService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDaCall {
    /// Called operation
    pub method: MockDaMethod,
    /// Namespace the operation was called with
    pub namespace: Namespace,
}

/// DA layer used in tests.
/// Every submission produces a new block, the first one at height 1.
/// Blocks are kept in memory for the lifetime of the service.
/// Every call is recorded and failures can be injected per namespace.
#[derive(Debug, Clone)]
pub struct MockDaService {
    config: MockDaConfig,
    blocks: Arc<AsyncMutex<BlockStore>>,
    calls: Arc<Mutex<Vec<MockDaCall>>>,
    failures: Arc<Mutex<HashMap<Namespace, DaError>>>,
}

impl Default for MockDaService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDaService {
    /// Creates a new [`MockDaService`] with default limits.
    pub fn new() -> Self {
        Self::with_config(MockDaConfig::default())
    }

    /// Creates a new [`MockDaService`] from the given configuration.
    #[tracing::instrument(name = "MockDA")]
    pub fn with_config(config: MockDaConfig) -> Self {
        Self {
            config,
            blocks: Arc::new(AsyncMutex::new(BlockStore::default())),
            calls: Arc::new(Mutex::new(vec![])),
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the latest block number
    pub async fn get_height(&self) -> u64 {
        self.blocks.lock().await.height()
    }

    /// Makes every call against `namespace` fail with `error` until
    /// [`MockDaService::clear_failure`] is called.
    pub fn fail_namespace(&self, namespace: Namespace, error: DaError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(namespace, error);
    }

    /// Removes a failure injected with [`MockDaService::fail_namespace`].
    pub fn clear_failure(&self, namespace: &Namespace) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(namespace);
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<MockDaCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Namespaces of the received calls of one kind, oldest first.
    pub fn namespaces_called(&self, method: MockDaMethod) -> Vec<Namespace> {
        self.calls()
            .into_iter()
            .filter(|call| call.method == method)
            .map(|call| call.namespace)
            .collect()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Records the call, then applies cancellation and injected failures.
    fn begin(
        &self,
        ctx: &CancellationToken,
        method: MockDaMethod,
        namespace: &Namespace,
    ) -> Result<(), DaError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockDaCall {
                method,
                namespace: *namespace,
            });

        if ctx.is_cancelled() {
            return Err(DaError::Cancelled);
        }

        if let Some(err) = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(namespace)
        {
            tracing::debug!(?method, %namespace, %err, "Injected failure");
            return Err(err.clone());
        }

        Ok(())
    }

    async fn find_blobs(&self, ids: &[ID], namespace: &Namespace) -> Result<Vec<Blob>, DaError> {
        let blocks = self.blocks.lock().await;
        ids.iter()
            .map(|id| {
                let (height, _) = split_id(id)?;
                blocks
                    .find(height, id, namespace)
                    .map(|blob| blob.data.clone())
                    .ok_or(DaError::NotFound)
            })
            .collect()
    }

    async fn store(&self, blobs: &[Blob], namespace: &Namespace) -> Result<Vec<ID>, DaError> {
        if let Some(blob) = blobs
            .iter()
            .find(|blob| blob.len() > self.config.max_blob_size)
        {
            return Err(DaError::BlobSizeOverLimit {
                size: blob.len(),
                max: self.config.max_blob_size,
            });
        }

        let ids = self.blocks.lock().await.push_block(*namespace, blobs);
        tracing::debug!(blobs = blobs.len(), %namespace, "Submitted blobs to MockDA");
        Ok(ids)
    }
}

#[async_trait]
impl DaApi for MockDaService {
    async fn get_ids(
        &self,
        ctx: &CancellationToken,
        height: u64,
        namespace: &Namespace,
    ) -> Result<GetIdsResult, DaError> {
        self.begin(ctx, MockDaMethod::GetIds, namespace)?;

        let blocks = self.blocks.lock().await;
        let block = blocks
            .get(height)
            .ok_or(DaError::HeightFromFuture(height))?;

        Ok(GetIdsResult {
            ids: block
                .blobs
                .iter()
                .filter(|blob| &blob.namespace == namespace)
                .map(|blob| blob.id.clone())
                .collect(),
            timestamp: block.timestamp,
        })
    }

    async fn get(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Blob>, DaError> {
        self.begin(ctx, MockDaMethod::Get, namespace)?;
        self.find_blobs(ids, namespace).await
    }

    async fn get_proofs(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Proof>, DaError> {
        self.begin(ctx, MockDaMethod::GetProofs, namespace)?;
        let blobs = self.find_blobs(ids, namespace).await?;
        Ok(blobs.iter().map(|blob| commitment(blob)).collect())
    }

    async fn validate(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        namespace: &Namespace,
    ) -> Result<Vec<bool>, DaError> {
        self.begin(ctx, MockDaMethod::Validate, namespace)?;
        if ids.len() != proofs.len() {
            return Err(DaError::Rpc(format!(
                "number of ids ({}) does not match number of proofs ({})",
                ids.len(),
                proofs.len()
            )));
        }

        let blobs = self.find_blobs(ids, namespace).await?;
        blobs
            .iter()
            .zip(ids.iter().zip(proofs))
            .map(|(blob, (id, proof))| {
                let (_, id_commitment) = split_id(id)?;
                Ok(id_commitment == proof.as_slice() && commitment(blob) == *proof)
            })
            .collect()
    }

    async fn submit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
    ) -> Result<Vec<ID>, DaError> {
        self.begin(ctx, MockDaMethod::Submit, namespace)?;
        tracing::trace!(gas_price, "Submitting blobs");
        self.store(blobs, namespace).await
    }

    async fn submit_with_options(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
        options: &[u8],
    ) -> Result<Vec<ID>, DaError> {
        self.begin(ctx, MockDaMethod::SubmitWithOptions, namespace)?;
        tracing::trace!(gas_price, options = %hex::encode(options), "Submitting blobs");
        self.store(blobs, namespace).await
    }

    async fn commit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        namespace: &Namespace,
    ) -> Result<Vec<Commitment>, DaError> {
        self.begin(ctx, MockDaMethod::Commit, namespace)?;
        Ok(blobs.iter().map(|blob| commitment(blob)).collect())
    }
}

// fix clippy for tracing::instrument
#![allow(clippy::blocks_in_conditions)]

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use da_interface::{
    Blob, CancellationToken, Commitment, DaApi, DaError, GetIdsResult, Namespace, Proof, ID,
};
use tracing::{debug, instrument, trace};

use crate::{MigrationConfigError, MigrationEntry, MigrationRegistry, NamespaceRole};

/// DA client that hides namespace migrations from its callers.
///
/// Height based lookups are sent to the namespace that was in effect at that
/// height. Lookups by blob id first try the namespace supplied by the caller
/// and then search the current and historical namespaces, one at a time.
/// Submissions always go to the namespace supplied by the caller.
///
/// When every candidate fails only the error of the last attempt is returned;
/// errors of earlier attempts are logged at debug level and dropped.
#[derive(Debug, Clone)]
pub struct NamespaceMigrationDa<Da> {
    inner: Da,
    registry: Arc<MigrationRegistry>,
}

impl<Da: DaApi> NamespaceMigrationDa<Da> {
    /// Wraps `inner` with the given registry.
    pub fn new(inner: Da, registry: MigrationRegistry) -> Self {
        Self {
            inner,
            registry: Arc::new(registry),
        }
    }

    /// Builds the registry from namespace names and wraps `inner` with it.
    pub fn from_names(
        inner: Da,
        current_namespace: &str,
        current_data_namespace: &str,
        migrations: impl IntoIterator<Item = MigrationEntry>,
    ) -> Result<Self, MigrationConfigError> {
        let registry =
            MigrationRegistry::new(current_namespace, current_data_namespace, migrations)?;
        Ok(Self::new(inner, registry))
    }

    /// The registry used to resolve namespaces.
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// The wrapped client.
    pub fn inner(&self) -> &Da {
        &self.inner
    }

    /// Like [`DaApi::get_ids`], with the role given explicitly.
    pub async fn get_ids_for_role(
        &self,
        ctx: &CancellationToken,
        height: u64,
        role: NamespaceRole,
    ) -> Result<GetIdsResult, DaError> {
        let namespace = self.registry.resolve_for_height(height, role);
        trace!(height, %role, %namespace, "Resolved namespace for height");
        self.inner.get_ids(ctx, height, namespace).await
    }

    /// Like [`DaApi::get`], searching only the namespaces of `role`, current first.
    pub async fn get_for_role(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        role: NamespaceRole,
    ) -> Result<Vec<Blob>, DaError> {
        let current = *self.registry.current().namespace_for(role);
        self.with_fallback(ctx, "get", &current, Some(role), |namespace| async move {
            self.inner.get(ctx, ids, &namespace).await
        })
        .await
    }

    /// Like [`DaApi::get_proofs`], searching only the namespaces of `role`, current first.
    pub async fn get_proofs_for_role(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        role: NamespaceRole,
    ) -> Result<Vec<Proof>, DaError> {
        let current = *self.registry.current().namespace_for(role);
        self.with_fallback(ctx, "get_proofs", &current, Some(role), |namespace| async move {
            self.inner.get_proofs(ctx, ids, &namespace).await
        })
        .await
    }

    /// Like [`DaApi::validate`], searching only the namespaces of `role`, current first.
    pub async fn validate_for_role(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        role: NamespaceRole,
    ) -> Result<Vec<bool>, DaError> {
        let current = *self.registry.current().namespace_for(role);
        self.with_fallback(ctx, "validate", &current, Some(role), |namespace| async move {
            self.inner.validate(ctx, ids, proofs, &namespace).await
        })
        .await
    }

    /// Runs `attempt` against `namespace`, then against every other candidate
    /// namespace of the same role until one succeeds.
    ///
    /// Without migrations, or when the first attempt was cancelled, the first
    /// result is returned as is. A namespace is never attempted twice.
    async fn with_fallback<T, F, Fut>(
        &self,
        ctx: &CancellationToken,
        operation: &'static str,
        namespace: &Namespace,
        role: Option<NamespaceRole>,
        attempt: F,
    ) -> Result<T, DaError>
    where
        F: Fn(Namespace) -> Fut,
        Fut: Future<Output = Result<T, DaError>>,
    {
        let mut last_err = match attempt(*namespace).await {
            Ok(res) => return Ok(res),
            Err(err) => err,
        };

        if last_err.is_cancelled() || self.registry.is_empty() {
            return Err(last_err);
        }
        if ctx.is_cancelled() {
            return Err(DaError::Cancelled);
        }

        let role = role.unwrap_or_else(|| self.registry.role_of(namespace));
        let mut tried = vec![*namespace];

        for candidate in self.registry.ordered_fallback_candidates(role) {
            if tried.contains(&candidate) {
                continue;
            }
            if ctx.is_cancelled() {
                return Err(DaError::Cancelled);
            }

            debug!(
                operation,
                %role,
                %candidate,
                error = %last_err,
                "Retrying with fallback namespace"
            );
            tried.push(candidate);

            let res = tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(DaError::Cancelled),
                res = attempt(candidate) => res,
            };

            match res {
                Ok(res) => {
                    debug!(operation, %role, %candidate, "Found blobs in fallback namespace");
                    return Ok(res);
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => last_err = err,
            }
        }

        debug!(
            operation,
            %role,
            attempts = tried.len(),
            error = %last_err,
            "All namespaces failed"
        );
        Err(last_err)
    }
}

#[async_trait]
impl<Da: DaApi> DaApi for NamespaceMigrationDa<Da> {
    #[instrument(level = "trace", skip_all, fields(height = height, namespace = %namespace))]
    async fn get_ids(
        &self,
        ctx: &CancellationToken,
        height: u64,
        namespace: &Namespace,
    ) -> Result<GetIdsResult, DaError> {
        let role = self.registry.role_of(namespace);
        self.get_ids_for_role(ctx, height, role).await
    }

    #[instrument(level = "trace", skip_all, fields(ids = ids.len(), namespace = %namespace))]
    async fn get(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Blob>, DaError> {
        self.with_fallback(ctx, "get", namespace, None, |namespace| async move {
            self.inner.get(ctx, ids, &namespace).await
        })
        .await
    }

    #[instrument(level = "trace", skip_all, fields(ids = ids.len(), namespace = %namespace))]
    async fn get_proofs(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        namespace: &Namespace,
    ) -> Result<Vec<Proof>, DaError> {
        self.with_fallback(ctx, "get_proofs", namespace, None, |namespace| async move {
            self.inner.get_proofs(ctx, ids, &namespace).await
        })
        .await
    }

    #[instrument(level = "trace", skip_all, fields(ids = ids.len(), namespace = %namespace))]
    async fn validate(
        &self,
        ctx: &CancellationToken,
        ids: &[ID],
        proofs: &[Proof],
        namespace: &Namespace,
    ) -> Result<Vec<bool>, DaError> {
        self.with_fallback(ctx, "validate", namespace, None, |namespace| async move {
            self.inner.validate(ctx, ids, proofs, &namespace).await
        })
        .await
    }

    // Submissions and commitments always target the namespace the caller supplies.

    async fn submit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
    ) -> Result<Vec<ID>, DaError> {
        self.inner.submit(ctx, blobs, gas_price, namespace).await
    }

    async fn submit_with_options(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        gas_price: f64,
        namespace: &Namespace,
        options: &[u8],
    ) -> Result<Vec<ID>, DaError> {
        self.inner
            .submit_with_options(ctx, blobs, gas_price, namespace, options)
            .await
    }

    async fn commit(
        &self,
        ctx: &CancellationToken,
        blobs: &[Blob],
        namespace: &Namespace,
    ) -> Result<Vec<Commitment>, DaError> {
        self.inner.commit(ctx, blobs, namespace).await
    }
}

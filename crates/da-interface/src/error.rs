use crate::NamespaceError;

/// Errors returned by a DA layer client.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DaError {
    /// No blob with the requested id exists under the requested namespace.
    #[error("blob: not found")]
    NotFound,
    /// The caller's context was cancelled before the call completed.
    #[error("context canceled")]
    Cancelled,
    /// The requested height has not been produced yet.
    #[error("given height is from the future: {0}")]
    HeightFromFuture(u64),
    /// A submitted blob exceeds the DA layer size limit.
    #[error("blob: over size limit: {size} > {max}")]
    BlobSizeOverLimit {
        /// Size of the rejected blob.
        size: usize,
        /// Limit enforced by the DA layer.
        max: usize,
    },
    /// A blob id could not be decoded.
    #[error("invalid blob id: {0}")]
    InvalidId(String),
    /// Namespace bytes could not be decoded.
    #[error(transparent)]
    InvalidNamespace(#[from] NamespaceError),
    /// Any other error reported by the DA node.
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl DaError {
    /// Returns true if the error was caused by cancellation of the caller's context.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DaError::Cancelled)
    }

    /// Returns true if the DA layer reported the blob as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DaError::NotFound)
    }
}

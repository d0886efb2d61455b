use da_interface::Namespace;
use serde::{Deserialize, Serialize};

/// The two kinds of blobs a chain posts to the DA layer, each under its own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceRole {
    /// Signed block headers.
    Header,
    /// Block data (transactions).
    Data,
}

impl core::fmt::Display for NamespaceRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NamespaceRole::Header => f.pad("header"),
            NamespaceRole::Data => f.pad("data"),
        }
    }
}

/// Header and data namespace of one namespace epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespaces {
    /// Namespace of header blobs
    pub header: Namespace,
    /// Namespace of data blobs
    pub data: Namespace,
}

impl Namespaces {
    /// Derives both namespaces from their names.
    pub fn from_names(header: &str, data: &str) -> Self {
        Self {
            header: Namespace::from_string(header),
            data: Namespace::from_string(data),
        }
    }

    /// Namespace used by blobs of the given role.
    pub fn namespace_for(&self, role: NamespaceRole) -> &Namespace {
        match role {
            NamespaceRole::Header => &self.header,
            NamespaceRole::Data => &self.data,
        }
    }
}

/// A past namespace epoch: blobs up to and including `until_height` were
/// posted under these namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MigrationEntry {
    /// Last height (inclusive) posted under this epoch's namespaces.
    pub until_height: u64,
    /// Header namespace name.
    pub namespace: String,
    /// Data namespace name. Falls back to `namespace` when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_namespace: Option<String>,
}

impl MigrationEntry {
    /// Creates an entry whose header and data blobs share one namespace.
    pub fn new(until_height: u64, namespace: impl Into<String>) -> Self {
        Self {
            until_height,
            namespace: namespace.into(),
            data_namespace: None,
        }
    }

    /// Sets a distinct data namespace.
    pub fn with_data_namespace(mut self, data_namespace: impl Into<String>) -> Self {
        self.data_namespace = Some(data_namespace.into());
        self
    }

    /// Header namespace name.
    pub fn header_namespace(&self) -> &str {
        &self.namespace
    }

    /// Data namespace name.
    pub fn data_namespace(&self) -> &str {
        match self.data_namespace.as_deref() {
            Some(data_namespace) if !data_namespace.is_empty() => data_namespace,
            _ => &self.namespace,
        }
    }

    pub(crate) fn namespaces(&self) -> Namespaces {
        Namespaces::from_names(self.header_namespace(), self.data_namespace())
    }
}

use std::collections::BTreeMap;

use da_interface::Namespace;
use tracing::debug;

mod entry;

pub use entry::*;

/// Errors detected while building a [`MigrationRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationConfigError {
    /// The current header namespace name is empty.
    #[error("current namespace must not be empty")]
    EmptyCurrentNamespace,
    /// A migration entry has an empty header namespace name.
    #[error("migration until height {0} has an empty namespace")]
    EmptyNamespace(u64),
    /// Two migration entries end at the same height.
    #[error("duplicate migration boundary at height {0}")]
    DuplicateBoundary(u64),
}

/// Immutable table of the namespaces a chain has used over its history.
///
/// Each migration covers every height up to its `until_height` that is not
/// covered by a migration with a lower boundary. Heights above the last
/// boundary belong to the current namespaces.
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    current: Namespaces,
    migrations: BTreeMap<u64, Namespaces>,
}

impl MigrationRegistry {
    /// Builds the registry. An empty `current_data_namespace` means data blobs
    /// share the header namespace.
    pub fn new(
        current_namespace: &str,
        current_data_namespace: &str,
        entries: impl IntoIterator<Item = MigrationEntry>,
    ) -> Result<Self, MigrationConfigError> {
        if current_namespace.is_empty() {
            return Err(MigrationConfigError::EmptyCurrentNamespace);
        }
        let current_data_namespace = if current_data_namespace.is_empty() {
            current_namespace
        } else {
            current_data_namespace
        };
        let current = Namespaces::from_names(current_namespace, current_data_namespace);

        let mut migrations = BTreeMap::new();
        for entry in entries {
            if entry.namespace.is_empty() {
                return Err(MigrationConfigError::EmptyNamespace(entry.until_height));
            }
            if migrations
                .insert(entry.until_height, entry.namespaces())
                .is_some()
            {
                return Err(MigrationConfigError::DuplicateBoundary(entry.until_height));
            }
            debug!(
                until_height = entry.until_height,
                namespace = entry.header_namespace(),
                data_namespace = entry.data_namespace(),
                "Registered namespace migration"
            );
        }

        Ok(Self {
            current,
            migrations,
        })
    }

    /// Registry without any migration. Every height resolves to the current namespaces.
    pub fn without_migrations(
        current_namespace: &str,
        current_data_namespace: &str,
    ) -> Result<Self, MigrationConfigError> {
        Self::new(current_namespace, current_data_namespace, [])
    }

    /// Namespaces blobs are posted under today.
    pub fn current(&self) -> &Namespaces {
        &self.current
    }

    /// Number of migrations.
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// True if the chain never changed namespaces.
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Migration boundaries, ascending.
    pub fn boundaries(&self) -> impl Iterator<Item = u64> + '_ {
        self.migrations.keys().copied()
    }

    /// Migrations with their boundaries, ascending.
    pub fn migrations(&self) -> impl Iterator<Item = (u64, &Namespaces)> + '_ {
        self.migrations.iter().map(|(height, ns)| (*height, ns))
    }

    /// Namespace holding blobs of `role` at `height`: the migration with the
    /// lowest boundary still at or above `height`, otherwise the current one.
    pub fn resolve_for_height(&self, height: u64, role: NamespaceRole) -> &Namespace {
        self.migrations
            .range(height..)
            .next()
            .map(|(_, namespaces)| namespaces.namespace_for(role))
            .unwrap_or_else(|| self.current.namespace_for(role))
    }

    /// Every namespace that may hold blobs of `role`: the current namespace
    /// first, then each migration by ascending boundary.
    pub fn ordered_fallback_candidates(&self, role: NamespaceRole) -> Vec<Namespace> {
        core::iter::once(&self.current)
            .chain(self.migrations.values())
            .map(|namespaces| *namespaces.namespace_for(role))
            .collect()
    }

    /// Classifies a raw namespace. Anything that is not a known data namespace
    /// is treated as a header namespace, including namespaces the registry has
    /// never seen.
    pub fn role_of(&self, namespace: &Namespace) -> NamespaceRole {
        let is_data = core::iter::once(&self.current)
            .chain(self.migrations.values())
            .any(|namespaces| &namespaces.data == namespace);

        if is_data {
            NamespaceRole::Data
        } else {
            NamespaceRole::Header
        }
    }
}

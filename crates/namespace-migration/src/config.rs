use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{default_migrations, MigrationConfigError, MigrationEntry, MigrationRegistry};

/// Namespaces the node currently posts under.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DaNamespaceConfig {
    /// Header namespace name
    pub namespace: String,
    /// Data namespace name, defaults to `namespace`
    #[serde(default)]
    pub data_namespace: Option<String>,
}

impl DaNamespaceConfig {
    /// Header namespace name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Data namespace name, or the header namespace name when unset.
    pub fn data_namespace(&self) -> &str {
        match self.data_namespace.as_deref() {
            Some(data_namespace) if !data_namespace.is_empty() => data_namespace,
            _ => &self.namespace,
        }
    }
}

/// Namespace configuration of a node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MigrationNodeConfig {
    /// Current namespaces
    pub da: DaNamespaceConfig,
    /// Historical namespaces. When absent the built-in [`crate::MIGRATIONS`] are used.
    #[serde(default)]
    pub migrations: Option<Vec<MigrationEntry>>,
}

impl MigrationNodeConfig {
    /// Migration entries in effect.
    pub fn migration_entries(&self) -> Vec<MigrationEntry> {
        self.migrations.clone().unwrap_or_else(default_migrations)
    }

    /// Builds the registry described by this configuration.
    pub fn registry(&self) -> Result<MigrationRegistry, MigrationConfigError> {
        MigrationRegistry::new(
            self.da.namespace(),
            self.da.data_namespace(),
            self.migration_entries(),
        )
    }
}

/// Reads toml file as a specific type.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> anyhow::Result<R> {
    let mut contents = String::new();
    {
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
    }
    tracing::debug!("Config file size: {} bytes", contents.len());
    tracing::trace!("Config file contents: {}", &contents);

    let result: R = toml::from_str(&contents)?;

    Ok(result)
}

#![deny(missing_docs)]
//! Operator tooling for namespace migrations: inspects how heights and raw
//! namespaces resolve and exercises the migration aware DA client.

use std::env;
use std::str::FromStr;

use anyhow::Context as _;
use namespace_migration::{from_toml_path, DaNamespaceConfig, MigrationNodeConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod demo;
pub use demo::run_demo;

/// Default initialization of logging. `RUST_LOG` takes precedence over `level`.
pub fn initialize_logging(level: tracing::Level) -> anyhow::Result<()> {
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string().to_lowercase());
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_str(&filter).context("Invalid log filter")?)
        .try_init()
        .context("Failed to initialize logging")?;
    log_panics::init();
    Ok(())
}

/// Loads the node configuration from `config_path`, or builds one from the
/// namespace names when no file is given. Names given explicitly override the file.
pub fn load_config(
    config_path: Option<&str>,
    namespace: Option<String>,
    data_namespace: Option<String>,
) -> anyhow::Result<MigrationNodeConfig> {
    let mut config = match (config_path, namespace.clone()) {
        (Some(path), _) => from_toml_path::<_, MigrationNodeConfig>(path)
            .with_context(|| format!("Failed to read configuration from {path}"))?,
        (None, Some(namespace)) => MigrationNodeConfig {
            da: DaNamespaceConfig {
                namespace,
                data_namespace: None,
            },
            migrations: None,
        },
        (None, None) => anyhow::bail!("Either --config or --namespace must be given"),
    };

    if let Some(namespace) = namespace {
        config.da.namespace = namespace;
    }
    if data_namespace.is_some() {
        config.da.data_namespace = data_namespace;
    }

    Ok(config)
}

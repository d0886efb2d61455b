use anyhow::Context as _;
use da_interface::{CancellationToken, DaApi};
use mock_da::{MockDaMethod, MockDaService};
use namespace_migration::{MigrationRegistry, NamespaceMigrationDa, NamespaceRole};
use tracing::info;

/// Posts one blob per namespace epoch to an in memory DA layer, then reads
/// every blob back through the migration aware client using only the current
/// namespaces. Returns the number of blobs read back.
pub async fn run_demo(registry: MigrationRegistry) -> anyhow::Result<usize> {
    let mock = MockDaService::new();
    let da = NamespaceMigrationDa::new(mock.clone(), registry);
    let ctx = CancellationToken::new();
    let mut found = 0;

    for role in [NamespaceRole::Header, NamespaceRole::Data] {
        let current = *da.registry().current().namespace_for(role);
        let epochs: Vec<_> = da
            .registry()
            .migrations()
            .map(|(until_height, namespaces)| (Some(until_height), *namespaces.namespace_for(role)))
            .chain(core::iter::once((None, current)))
            .collect();

        for (until_height, namespace) in epochs {
            let blob = format!("{role} blob of epoch ending at {until_height:?}").into_bytes();
            let ids = mock
                .submit(&ctx, &[blob.clone()], 0.0, &namespace)
                .await
                .with_context(|| format!("Failed to submit to {namespace}"))?;

            mock.clear_calls();
            let blobs = da
                .get(&ctx, &ids, &current)
                .await
                .with_context(|| format!("Blob posted to {namespace} was not found"))?;
            anyhow::ensure!(blobs == vec![blob], "Blob posted to {namespace} changed");

            let attempts = mock.namespaces_called(MockDaMethod::Get).len();
            info!(%role, ?until_height, %namespace, attempts, "Found blob");
            println!("{role:<6} {namespace} found after {attempts} attempt(s)");
            found += 1;
        }
    }

    Ok(found)
}

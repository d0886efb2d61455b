use crate::MigrationEntry;

/// Namespace migrations of the network, as `(until_height, namespace, data_namespace)`.
/// Heights above the last boundary use the namespaces from the node configuration.
pub const MIGRATIONS: [(u64, &str, &str); 1] = [
    (8_130_490, "rollkit-headers", "rollkit-data"),
    // Further migrations are appended with ascending boundaries
    // (until_height, "headers-v2", "data-v2"),
];

/// [`MIGRATIONS`] as registry entries.
pub fn default_migrations() -> Vec<MigrationEntry> {
    MIGRATIONS
        .iter()
        .map(|(until_height, namespace, data_namespace)| {
            MigrationEntry::new(*until_height, *namespace).with_data_namespace(*data_namespace)
        })
        .collect()
}

use clap::{Parser, Subcommand};
use da_interface::Namespace;
use namespace_migration::{MigrationRegistry, NamespaceRole};
use ns_resolver::{initialize_logging, load_config, run_demo};
use tracing::{error, info};

/// Inspects the namespace migrations of a chain.
///
/// Current namespaces come from the `[da]` section of the config file (or the
/// `--namespace` flags), historical ones from its `[[migrations]]` entries or
/// the built-in migration table.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the node config.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Current header namespace name. Overrides the config file.
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Current data namespace name. Overrides the config file.
    #[arg(long, global = true)]
    data_namespace: Option<String>,

    /// Logging verbosity
    #[arg(long, short = 'v', action = clap::ArgAction::Count, default_value = "2", global = true)]
    verbose: u8,
    /// Logging verbosity
    #[arg(long, short = 'q', action, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the current header and data namespaces.
    Namespaces,
    /// Prints the namespace holding blobs of a role at a height.
    Resolve {
        /// DA height
        #[arg(long)]
        height: u64,
        /// Blob role
        #[arg(long, default_value = "header")]
        role: Role,
    },
    /// Prints the namespaces searched, in order, for blobs of unknown height.
    Candidates {
        /// Blob role
        #[arg(long, default_value = "header")]
        role: Role,
    },
    /// Prints the role a raw namespace is classified as.
    Classify {
        /// Namespace bytes as hex, with or without 0x prefix
        #[arg(long)]
        raw: Namespace,
    },
    /// Reads blobs of every namespace epoch back from an in memory DA layer.
    Demo,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Role {
    Header,
    Data,
}

impl From<Role> for NamespaceRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Header => NamespaceRole::Header,
            Role::Data => NamespaceRole::Data,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let mut args = Args::parse();

    if args.quiet {
        args.verbose = 0;
    }
    let logging_level = match args.verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        4 => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };
    initialize_logging(logging_level)?;

    let config = load_config(
        args.config.as_deref(),
        args.namespace.clone(),
        args.data_namespace.clone(),
    )?;
    let registry = config.registry()?;

    info!(
        header_namespace = %registry.current().header,
        data_namespace = %registry.current().data,
        migrations = registry.len(),
        "namespaces"
    );

    if let Err(e) = run(args.command, registry).await {
        error!("Error: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(command: Command, registry: MigrationRegistry) -> anyhow::Result<()> {
    match command {
        Command::Namespaces => {
            println!("header {}", registry.current().header);
            println!("data   {}", registry.current().data);
            for (until_height, namespaces) in registry.migrations() {
                println!(
                    "until {until_height}: header {} data {}",
                    namespaces.header, namespaces.data
                );
            }
        }
        Command::Resolve { height, role } => {
            println!("{}", registry.resolve_for_height(height, role.into()));
        }
        Command::Candidates { role } => {
            for namespace in registry.ordered_fallback_candidates(role.into()) {
                println!("{namespace}");
            }
        }
        Command::Classify { raw } => {
            println!("{}", registry.role_of(&raw));
        }
        Command::Demo => {
            let found = run_demo(registry).await?;
            info!(found, "Demo finished");
        }
    }

    Ok(())
}

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use drydock_cli::{commands, profiles};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage profiles (saved service/output pairs)
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Mirror every matching design file into the export root
    Export {
        #[arg(long)]
        service_url: Option<String>,
        #[arg(long, required_unless_present = "profile")]
        root: Option<Utf8PathBuf>,
        #[arg(short, long, help = "Use settings from a named profile")]
        profile: Option<String>,
        #[arg(long, default_value = drydock_config::DEFAULT_EXPORT_FORMAT)]
        format: String,
        #[arg(
            long,
            default_value_t = drydock_config::DEFAULT_STABILIZATION_DELAY_MS,
            help = "Settling delay around open/activate/close, in milliseconds"
        )]
        delay_ms: u64,
        #[arg(long, help = "Re-export files that already exist locally")]
        force: bool,
    },
    /// Show what an export would do without opening any documents
    Plan {
        #[arg(long)]
        service_url: Option<String>,
        #[arg(long, required_unless_present = "profile")]
        root: Option<Utf8PathBuf>,
        #[arg(short, long, help = "Use settings from a named profile")]
        profile: Option<String>,
        #[arg(long, default_value = drydock_config::DEFAULT_EXPORT_FORMAT)]
        format: String,
    },
    /// Print the remote hub/project/folder hierarchy
    Tree {
        #[arg(long)]
        service_url: Option<String>,
        #[arg(short, long, help = "Use settings from a named profile")]
        profile: Option<String>,
        #[arg(short, long, help = "Save the JSON snapshot to a file")]
        output: Option<Utf8PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    List,
    Add {
        #[arg(long, help = "Unique slug ID for the profile")]
        id: String,
        name: String,
        service_url: String,
        export_root: Utf8PathBuf,
    },
    Remove {
        name: String,
    },
}

/// Profile settings win wholesale over flag defaults when given.
fn resolve_target(
    service_url: Option<String>,
    root: Option<Utf8PathBuf>,
    profile: Option<String>,
) -> anyhow::Result<(String, Utf8PathBuf, Option<String>)> {
    if let Some(name) = profile {
        let p = profiles::ProfileManager::new().find(&name)?;
        Ok((p.service_url, Utf8PathBuf::from(p.export_root), Some(p.id)))
    } else {
        Ok((
            resolve_service_url(service_url, None)?,
            root.expect("clap enforces --root without --profile"),
            None,
        ))
    }
}

/// Same resolution for commands that only need a service URL.
fn resolve_service_url(
    service_url: Option<String>,
    profile: Option<String>,
) -> anyhow::Result<String> {
    if let Some(name) = profile {
        return Ok(profiles::ProfileManager::new().find(&name)?.service_url);
    }
    Ok(service_url.unwrap_or_else(|| drydock_config::DEFAULT_SERVICE_URL.to_string()))
}

// Current-thread runtime: the walk is one sequential call chain with never
// more than one in-flight service operation.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("default subscriber");

    match cli.command {
        Commands::Profile { command } => match command {
            ProfileCommands::List => profiles::handle_list()?,
            ProfileCommands::Add {
                id,
                name,
                service_url,
                export_root,
            } => profiles::handle_add(id, name, service_url, export_root)?,
            ProfileCommands::Remove { name } => profiles::handle_remove(name)?,
        },
        Commands::Export {
            service_url,
            root,
            profile,
            format,
            delay_ms,
            force,
        } => {
            let (service_url, root, profile_id) = resolve_target(service_url, root, profile)?;
            commands::cmd_export(service_url, root, format, delay_ms, force, profile_id).await?;
        }
        Commands::Plan {
            service_url,
            root,
            profile,
            format,
        } => {
            let (service_url, root, _profile_id) = resolve_target(service_url, root, profile)?;
            commands::cmd_plan(service_url, root, format).await?;
        }
        Commands::Tree {
            service_url,
            profile,
            output,
        } => {
            let service_url = resolve_service_url(service_url, profile)?;
            commands::cmd_tree(service_url, output).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use forma_core::ScreenType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "forma", version, about = "Forma CLI - dynamic form configuration and resolution")]
struct Cli {
    /// Path to the project configuration file
    #[arg(long, short = 'c', global = true, env = "FORMA_CONFIG", default_value = "forma.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate layouts and access rules (schemas, dependencies, defaults, tenancy).
    Check,

    /// Resolve a form for a role and print the rendering plan as JSON.
    Resolve {
        #[command(flatten)]
        target: TargetArgs,

        /// JSON or YAML file with the current form values
        #[arg(long)]
        data: Option<PathBuf>,

        /// Set a single form value (field=value, value parsed as JSON when possible)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// Print compact JSON instead of pretty-printed
        #[arg(long, default_value_t = false)]
        compact: bool,
    },

    /// Print the effective view/edit permission of every ruled field for a role.
    Access {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Who is asking, and for which screen.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Screen type (submission, approval, administration, read_only)
    #[arg(long)]
    pub screen: ScreenType,

    /// Requesting role
    #[arg(long)]
    pub role: String,

    /// Entity kind (e.g. AI_AGENT)
    #[arg(long)]
    pub kind: Option<String>,

    /// Entity category (e.g. Analytics)
    #[arg(long)]
    pub category: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Check => commands::check::run(&cli.config)?,

        Command::Resolve {
            target,
            data,
            set,
            compact,
        } => commands::resolve::run_resolve(&cli.config, &target, data.as_deref(), &set, compact)?,

        Command::Access { target } => commands::resolve::run_access(&cli.config, &target)?,
    }

    Ok(())
}

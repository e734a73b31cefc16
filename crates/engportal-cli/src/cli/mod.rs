//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use engportal_core::session::{SessionEvent, SessionStore};
use engportal_core::tasks::TaskKind;
use engportal_core::{Portal, config, logging};
use tokio::sync::broadcast;

mod commands;

#[derive(Parser)]
#[command(name = "engportal")]
#[command(version)]
#[command(about = "Field engineer portal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show server reachability and who is logged in
    Status,

    /// Log in with email and password
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(short, long, env = "ENGPORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget the stored session
    Logout,

    /// List assigned projects
    Projects,

    /// List, add or delete daily and monthly tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show dashboard counts across all projects
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TaskCommands {
    /// List tasks of a project for a day or month
    List {
        /// daily or monthly
        kind: TaskKind,
        /// Project ID
        #[arg(value_name = "PROJECT_ID")]
        project: String,
        /// YYYY-MM-DD for daily, YYYY-MM for monthly (default: current)
        #[arg(long)]
        period: Option<String>,
    },
    /// Add one or more tasks to a project
    Add {
        /// daily or monthly
        kind: TaskKind,
        /// Project ID
        #[arg(value_name = "PROJECT_ID")]
        project: String,
        /// Date the tasks belong to (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Task as "title" or "title::note"; repeat for several
        #[arg(long = "task", value_name = "TITLE[::NOTE]")]
        tasks: Vec<String>,
    },
    /// Delete a task
    Delete {
        /// daily or monthly
        kind: TaskKind,
        /// Task ID
        #[arg(value_name = "TASK_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the API base URL in the config file
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Path => {
                    commands::config::path();
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(),
                ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
            };
        }
        command => command,
    };

    let config = config::Config::load().context("load config")?;
    let portal =
        Portal::from_config(&config, SessionStore::open_default()).context("set up client")?;

    // Logging out with a stale token is not worth an expiry notice.
    if let Commands::Logout = command {
        return commands::auth::logout(&portal).await;
    }

    let mut events = portal.store.subscribe();
    let result = match command {
        Commands::Status => commands::status::run(&portal).await,
        Commands::Login { email, password } => {
            commands::auth::login(&portal, &email, password).await
        }
        Commands::Projects => commands::projects::list(&portal).await,
        Commands::Tasks { command } => match command {
            TaskCommands::List {
                kind,
                project,
                period,
            } => commands::tasks::list(&portal, kind, &project, period.as_deref()).await,
            TaskCommands::Add {
                kind,
                project,
                date,
                tasks,
            } => {
                commands::tasks::add(&portal, kind, &project, date.as_deref(), &tasks).await
            }
            TaskCommands::Delete { kind, id } => {
                commands::tasks::delete(&portal, kind, &id).await
            }
        },
        Commands::Stats => commands::stats::show(&portal).await,
        Commands::Logout | Commands::Config { .. } => Ok(()),
    };

    if session_expired(&portal, &mut events) {
        eprintln!("Session expired. Please log in again.");
    }
    result
}

/// Applies pending session events to the gate and reports whether the
/// session expired during the command.
fn session_expired(portal: &Portal, events: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut expired = false;
    loop {
        match events.try_recv() {
            Ok(event) => {
                portal.gate.handle_event(event);
                expired |= event == SessionEvent::Expired;
            }
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    expired
}

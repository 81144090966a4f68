//! webprof CLI - browse recorded request profiles from the terminal
//!
//! Provides `webprof record`, `webprof panel`, `webprof search`, and the rest
//! of the profiler's pages.

mod commands;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use webprof_core::storage::Database;
use webprof_core::{Profiler, SqliteStorage};
use webprof_web::{ProfilerConfig, ProfilerController, CONFIG_FILE};

use commands::record::RecordArgs;

const DATABASE_FILE: &str = "profiles.db";
const SESSION_FILE: &str = "session.json";

#[derive(Parser)]
#[command(name = "webprof")]
#[command(about = "webprof - developer profiler for web requests")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to ~/.webprof)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <data dir>/webprof.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a profile for a finished request
    Record(RecordArgs),
    /// Show one panel of a profile
    Panel {
        /// Profile token
        token: String,
        /// Panel name (defaults to "request")
        #[arg(long)]
        panel: Option<String>,
        /// Page within the panel (defaults to "home")
        #[arg(long)]
        page: Option<String>,
        /// Render only the panel fragment, as for an XHR request
        #[arg(long)]
        xhr: bool,
    },
    /// Export a profile
    Export {
        /// Profile token
        token: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import an exported profile
    Import {
        /// File written by `webprof export`
        file: PathBuf,
    },
    /// Delete every stored profile
    Purge,
    /// Show an informational message page
    Info {
        /// Message key (purge, no_token, upload_error, already_exists)
        about: String,
    },
    /// Render the debug toolbar for a profile
    Toolbar {
        /// Profile token
        token: Option<String>,
        /// Toolbar position (defaults to the configured position)
        #[arg(long)]
        position: Option<String>,
    },
    /// Render the search bar with the last search filled in
    SearchBar,
    /// Search profiles and print where the results are
    Search {
        #[command(flatten)]
        filter: FilterArgs,
        /// Jump straight to this token
        #[arg(long)]
        token: Option<String>,
    },
    /// Show search results
    Results {
        /// Token of the profile the results were reached from
        token: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Dump information about the runtime
    RuntimeInfo,
}

/// Search filter flags
#[derive(Args)]
struct FilterArgs {
    /// Client IP substring
    #[arg(long)]
    ip: Option<String>,
    /// HTTP method substring
    #[arg(long)]
    method: Option<String>,
    /// URL substring
    #[arg(long)]
    url: Option<String>,
    /// Maximum number of results
    #[arg(long)]
    limit: Option<String>,
}

impl FilterArgs {
    fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("ip", &self.ip),
            ("method", &self.method),
            ("url", &self.url),
            ("limit", &self.limit),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn get_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    Ok(home.join(".webprof"))
}

fn open_controller(data_dir: &Path, config_path: Option<PathBuf>) -> Result<ProfilerController> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

    let config_path = config_path.unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let config = ProfilerConfig::load_optional(&config_path);

    let db = Database::open(&data_dir.join(DATABASE_FILE))?;
    let profiler = Profiler::with_default_collectors(Box::new(SqliteStorage::new(db)));

    Ok(ProfilerController::from_config(profiler, &config))
}

fn run(cli: Cli) -> Result<()> {
    let data_dir = get_data_dir(cli.data_dir)?;
    let controller = open_controller(&data_dir, cli.config)?;
    let session_path = data_dir.join(SESSION_FILE);

    match cli.command {
        Commands::Record(args) => commands::record::execute(controller.profiler(), &args),
        Commands::Panel {
            token,
            panel,
            page,
            xhr,
        } => commands::page::panel(&controller, &token, panel, page, xhr),
        Commands::Export { token, output } => {
            commands::page::export(&controller, &token, output.as_deref())
        }
        Commands::Import { file } => commands::page::import(&controller, &file),
        Commands::Purge => commands::page::print(&controller.purge()?),
        Commands::Info { about } => commands::page::print(&controller.info(&about)?),
        Commands::Toolbar { token, position } => commands::page::toolbar(
            &controller,
            &session_path,
            token.as_deref(),
            position.as_deref(),
        ),
        Commands::SearchBar => commands::page::search_bar(&controller, &session_path),
        Commands::Search { filter, token } => {
            let mut params = filter.pairs();
            if let Some(token) = token.as_deref() {
                params.push(("token", token));
            }
            commands::page::search(&controller, &session_path, &params)
        }
        Commands::Results { token, filter } => {
            commands::page::results(&controller, &token, &filter.pairs())
        }
        Commands::RuntimeInfo => commands::page::print(&controller.runtime_info()?),
    }
}

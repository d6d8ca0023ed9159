use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use slask::application::errors::BotError;
use slask::application::services::{self, Harness};
use slask::infrastructure::adapters::{ConsoleAdapter, SlackAdapter};
use slask::infrastructure::config::Config;
use slask::infrastructure::database::Database;
use slask::infrastructure::logging;
use slask::infrastructure::plugins::LibraryLoader;
use slask::plugins::PluginRegistry;

#[derive(Parser)]
#[command(name = "slask")]
#[command(about = "A plugin-driven chat bot", long_about = None, version)]
struct Cli {
    /// Start an interactive session instead of connecting
    #[arg(short, long)]
    test: bool,

    /// Hook that harness input is fired as
    #[arg(long, default_value = "message")]
    hook: String,

    /// Run one command through the harness and exit
    #[arg(short = 'c', value_name = "COMMAND")]
    command: Option<String>,

    /// SQLite database handed to plugins
    #[arg(short, long, default_value = "slask.sqlite3")]
    database: PathBuf,

    /// Config file path
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Plugin directory (overrides config)
    #[arg(long)]
    pluginpath: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = &cli.pluginpath {
        config.plugins.directory = dir.clone();
    }

    if cli.print_config {
        return print_config(&config);
    }

    if let Err(e) = logging::init(&config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: Config) -> Result<(), BotError> {
    let config = Arc::new(config);

    let registry = PluginRegistry::from_config(&config.plugins, &LibraryLoader::new());
    tracing::info!("Plugin system initialized with {} plugins", registry.len());
    let registry = Arc::new(registry);

    let db = Database::new(&cli.database)?;

    if let Some(command) = &cli.command {
        let harness = Harness::new(config, registry, db);
        if let Some(reply) = harness.run_once(command, &cli.hook) {
            println!("{}", reply);
        }
        return Ok(());
    }

    if cli.test {
        let harness = Harness::new(config, registry, db);
        return harness
            .repl(&mut ConsoleAdapter::stdio(), &cli.hook)
            .map_err(|e| BotError::Internal(format!("console: {}", e)));
    }

    let token = config.require_token()?.to_string();
    let mut transport = SlackAdapter::new(token, config.api_base.clone());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BotError::Internal(format!("runtime: {}", e)))?;
    rt.block_on(services::run(&mut transport, config, registry, db))
}

fn print_config(config: &Config) -> ExitCode {
    let mut shown = config.clone();
    shown.token = config.token.as_ref().map(|_| config.masked_token());

    match serde_yaml::to_string(&shown) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("Save this to config.yaml and adjust as needed.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            ExitCode::FAILURE
        }
    }
}

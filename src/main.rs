use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use gitdeck::app::{App, AppEvent};
use gitdeck::config::Config;
use gitdeck::git::{CommandRunner, GitCli, ProcessCommandRunner, RepoSource};
use gitdeck::keybindings::{BindingTable, KeyConfig};

/// Get the default config file path (~/.config/gitdeck/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("gitdeck")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "gitdeck", about = "Keyboard-driven terminal client for git")]
struct Args {
    /// Repository to open (defaults to the current directory)
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Config file to use instead of ~/.config/gitdeck/config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write logs to this file (the terminal belongs to the UI)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file.as_ref())?;

    if let Some(path) = &args.path {
        std::env::set_current_dir(path)
            .with_context(|| format!("Failed to open repository at '{}'", path.display()))?;
    }
    let repo_dir = std::env::current_dir().context("Failed to resolve working directory")?;

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;

    let overrides = config.keybinding_overrides()?;
    let (keys, warnings) = KeyConfig::with_overrides(&overrides);
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    // Bad keys and malformed custom commands are fatal before the UI starts
    let bindings = BindingTable::build(&keys, &config.custom_commands)?;

    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessCommandRunner::new(&repo_dir));
    let repo: Arc<dyn RepoSource> = Arc::new(GitCli::new(runner.clone()));
    tracing::info!(repo = %repo_dir.display(), "Starting gitdeck");

    let mut app = App::new(config, config_path, keys, bindings, repo, runner);

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(64);

    gitdeck::ui::run(&mut app, event_tx, event_rx).await?;
    Ok(())
}

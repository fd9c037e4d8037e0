use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::{ConfigLoader, CONFIG_ENV, DATA_ENV};
use crate::storage;

pub mod commands;

use self::commands::{ListArgs, NewArgs};

const LOG_FILE_NAME: &str = "terminal-notes.log";

#[derive(Parser, Debug)]
#[command(
    name = "terminal-notes",
    version,
    about = "Keyboard-driven notes in your terminal"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over TERMINAL_NOTES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the notes file (takes precedence over TERMINAL_NOTES_DATA)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Create a new note from the command line
    New(NewArgs),
    /// Print notes in sorted order
    List(ListArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }
    if let Some(path) = &cli.data_file {
        env::set_var(DATA_ENV, path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let command = cli.command.unwrap_or(Commands::Tui);
    // The TUI owns the terminal, so its logs go to a file.
    let log_file = matches!(command, Commands::Tui).then(|| loader.paths().log_dir.join(LOG_FILE_NAME));
    init_tracing(&cli.log_level, log_file.as_deref())
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let storage = storage::init(&config.storage)?;

    let config = Arc::new(config);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, storage)?;
            commands::run_tui(&mut app)
        }
        Commands::New(args) => commands::new_note(config, storage, args),
        Commands::List(args) => commands::list_notes(config, storage, args),
    }
}

fn init_tracing(level: &str, log_file: Option<&Path>) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt().with_env_filter(env_filter);
        match log_file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            }
            None => builder.with_writer(std::io::stderr).init(),
        }
        Ok(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from([
            "terminal-notes",
            "--data-file",
            "/tmp/notes.json",
            "new",
            "Groceries",
            "--content",
            "Milk, eggs",
            "--priority",
            "high",
        ]);
        assert_eq!(cli.data_file.as_deref(), Some(Path::new("/tmp/notes.json")));
        match cli.command {
            Some(Commands::New(args)) => {
                assert_eq!(args.title.as_deref(), Some("Groceries"));
                assert_eq!(args.priority, crate::storage::Priority::High);
                assert!(!args.obscured);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from(["terminal-notes", "list", "--sort", "date-desc"]);
        assert!(matches!(
            cli.command,
            Some(Commands::List(ListArgs {
                sort: Some(crate::config::SortMode::DateDesc)
            }))
        ));
    }
}

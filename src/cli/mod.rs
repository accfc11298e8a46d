use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::config::ConfigLoader;
use crate::storage::NoteStore;

pub mod commands;

use self::commands::{AddArgs, DeleteArgs, ListArgs, MoveArgs, WeatherArgs};

#[derive(Parser, Debug)]
#[command(
    name = "notecard",
    version,
    about = "Keyboard-first terminal notes board with a small weather lookup"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over NOTECARD_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over NOTECARD_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Create a note from the command line
    Add(AddArgs),
    /// Print the note list, optionally filtered
    List(ListArgs),
    /// Delete one note by id, or every note
    Delete(DeleteArgs),
    /// Move one note directly before another
    Move(MoveArgs),
    /// Look up current weather for a city
    Weather(WeatherArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("NOTECARD_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("NOTECARD_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let config = loader.load_or_init()?;
    let store = NoteStore::new(paths.slot_path.clone());

    let config = Arc::new(config);
    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, store)?;
            commands::run_tui(&mut app)
        }
        Commands::Add(args) => commands::add_note(config, store, args),
        Commands::List(args) => commands::list_notes(store, args),
        Commands::Delete(args) => commands::delete_notes(store, args),
        Commands::Move(args) => commands::move_note(store, args),
        Commands::Weather(args) => commands::city_weather(config, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}

//! llm-rpg Entry Point
//!
//! Launches the terminal game.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (Ollama on localhost:11434, qwen3:8b)
//! llm-rpg
//!
//! # Another model on another host
//! llm-rpg --host 192.168.1.20 --model llama3:8b
//!
//! # Custom config file, skip the title card
//! llm-rpg --config ./office.toml --no-title
//!
//! # Verbose logging (written to the log file, not the screen)
//! RUST_LOG=debug llm-rpg
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dialogue_core::{load_config_from_path, ConfigOverrides, GameConfig};
use llm_rpg_tui::App;

/// llm-rpg - walk around an office and talk to LLM-backed colleagues
#[derive(Parser, Debug)]
#[command(name = "llm-rpg")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "LLM_RPG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ollama host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Ollama port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Model to talk through
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Ceiling for one model reply, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Target frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Skip the title card
    #[arg(long)]
    no_title: bool,

    /// Log file path
    #[arg(long, env = "LLM_RPG_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "LLM_RPG_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            model: self.model.clone(),
            request_timeout_secs: self.timeout,
            fps: self.fps,
            show_title: self.no_title.then_some(false),
        }
    }
}

/// Default log location: `$XDG_CACHE_HOME/llm-rpg/llm-rpg.log`
fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("llm-rpg")
        .join("llm-rpg.log")
}

/// Log to a file so the alternate screen stays clean
fn init_logging(args: &Args) -> Result<PathBuf> {
    let path = args.log_file.clone().unwrap_or_else(default_log_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {parent:?}"))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {path:?}"))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();

    Ok(path)
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config =
        load_config_from_path(args.config.clone()).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line override")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = init_logging(&args)?;

    let config = load_config(&args)?;
    tracing::info!(
        log = ?log_path,
        config = ?config.config_file_path,
        "Configuration loaded"
    );

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: llm-rpg requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    // Restore the terminal before printing a panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result {
        Ok(Some(goodbye)) => {
            println!("\n{goodbye}\n");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, "Game exited with an error");
            Err(e)
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &GameConfig,
) -> Result<Option<String>> {
    let mut app = App::new(config)?;
    app.run(terminal).await?;
    tracing::info!("Game closed");
    Ok(app.goodbye().map(ToString::to_string))
}

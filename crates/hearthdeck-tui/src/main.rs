mod hub;
mod state;
mod theme;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use hearthdeck_core::Config;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    env, fs, io,
    path::{Path, PathBuf},
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hearthdeck")]
#[command(about = "Terminal dashboard for a home-automation hub", long_about = None)]
struct Cli {
    /// Config file location (defaults to the per-user config dir).
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and exit.
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    if let Some(Commands::Init) = cli.command {
        return write_default_config(&config_path);
    }

    let text = fs::read_to_string(&config_path).with_context(|| {
        format!(
            "cannot read config {} (create one with: hearthdeck init)",
            config_path.display()
        )
    })?;
    let config = Config::from_json(&text)
        .with_context(|| format!("config file {} is invalid", config_path.display()))?;

    hub::probe(&config).await?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let mut app = state::App::new(&config, command_tx);
    tokio::spawn(hub::hub_loop(config, event_tx, command_rx));

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, event_rx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut state::App,
    mut hub_rx: mpsc::UnboundedReceiver<hub::HubEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;
        tokio::select! {
            Some(event) = hub_rx.recv() => {
                app.apply_hub_event(event);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key)))
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                    {
                        app.handle_key(key);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                    None => return Ok(()),
                }
            }
            else => return Ok(()),
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        env::var("HEARTHDECK_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("yes")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing config at {}", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create config dir {}", parent.display()))?;
    }
    fs::write(path, Config::default_template())
        .with_context(|| format!("cannot write config {}", path.display()))?;
    println!("wrote default config to {}", path.display());
    Ok(())
}

fn default_config_path() -> PathBuf {
    config_base().join("hearthdeck/config.json")
}

fn config_base() -> PathBuf {
    if let Ok(path) = env::var("XDG_CONFIG_HOME") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    home_dir().join(".config")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_the_default_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        write_default_config(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(Config::from_json(&written).is_ok());

        let err = write_default_config(&path).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }
}

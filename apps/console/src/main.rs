use std::{io::BufRead, path::PathBuf, thread};

use anyhow::Result;
use clap::Parser;
use client_core::{AppContext, SessionController};
use shared::domain::FileFormat;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use commands::{parse_command, ConsoleCommand, HELP};
use config::{load_settings, Settings};
use terminal::TerminalView;

#[derive(Parser, Debug)]
#[command(name = "crawl-console", about = "Drive exam crawls from the terminal")]
struct Args {
    /// Crawl server base URL, e.g. http://127.0.0.1:8000
    #[arg(long)]
    server_url: Option<String>,
    /// TOML settings file (defaults to ./crawl-console.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format used when `start` names none
    #[arg(long)]
    format: Option<FileFormat>,
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.server_url {
            settings.server_url = v;
        }
        if let Some(v) = self.format {
            settings.default_format = v;
        }
        if let Some(v) = self.download_dir {
            settings.download_dir = v;
        }
    }
}

/// Blocking stdin reader on its own thread so exit never waits on a read.
fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    args.apply(&mut settings);
    let client_settings = settings.client_settings()?;
    info!(
        server_url = %client_settings.server_url,
        download_dir = %client_settings.download_dir.display(),
        "crawl console starting"
    );

    let (ctx, rx) = AppContext::with_backend(client_settings);
    let handle = ctx.handle();
    let controller = SessionController::new(ctx, Box::new(TerminalView::stdout()))?;
    let controller_task = tokio::spawn(controller.run(rx));

    println!("{HELP}");
    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line else { break };
                match parse_command(&line, settings.default_format) {
                    Ok(ConsoleCommand::Send(command)) => {
                        if !handle.send(command) {
                            warn!("controller stopped");
                            break;
                        }
                    }
                    Ok(ConsoleCommand::Help) => println!("{HELP}"),
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(ConsoleCommand::Empty) => {}
                    Err(err) => println!("{err:#}"),
                }
            }
        }
    }

    handle.shutdown();
    controller_task.await?;
    Ok(())
}

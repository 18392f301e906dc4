use clap::Parser;
use forward::{Callbacks, Forward, ForwardCommand, ForwardConfig};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Animated skip-forward control", long_about = None)]
struct Cli {
    /// TOML file with widget attributes
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Activate the control automatically every N milliseconds
    #[arg(long, value_name = "MS")]
    autoplay_ms: Option<u64>,

    /// Window title, overriding the attribute file
    #[arg(long)]
    title: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => ForwardConfig::load_or_default(path),
        None => ForwardConfig::default(),
    };
    if let Some(title) = cli.title {
        config.title = title;
    }

    let (tx, rx) = mpsc::channel();

    // Lines on stdin drive the widget: empty or "skip" activates
    let stdin_tx = tx.clone();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "" | "skip" => ForwardCommand::Activate,
                "cancel" => ForwardCommand::Cancel,
                "quit" | "exit" => ForwardCommand::Close,
                other => {
                    info!(input = other, "unrecognised command");
                    continue;
                }
            };
            if stdin_tx.send(command).is_err() {
                break;
            }
        }
    });

    if let Some(period) = cli.autoplay_ms.filter(|ms| *ms > 0) {
        thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(period));
            if tx.send(ForwardCommand::Activate).is_err() {
                break;
            }
        });
    }

    let listener = Callbacks::new()
        .on_start(|| info!("skip forward started"))
        .on_end(|| info!("skip forward finished"));

    let mut forward = Forward::new(config).with_listener(listener);
    if let Err(e) = forward.show_with_commands(rx) {
        error!("{e}");
        process::exit(1);
    }
}

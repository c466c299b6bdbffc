use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "focusroom", version, about = "Focusroom Pomodoro timer CLI")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Timer presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Recorded sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Todo list
    Todo {
        #[command(subcommand)]
        action: commands::todo::TodoAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("FOCUSROOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Todo { action } => commands::todo::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

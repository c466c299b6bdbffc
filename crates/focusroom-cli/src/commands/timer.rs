use clap::Subcommand;
use focusroom_core::{Command, DocumentStore, DriverOptions, TimerDriver, TimerMode};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::common::{print_json, CliResult, Context, StderrNotifier};

type Driver<'a> = TimerDriver<&'a dyn DocumentStore, StderrNotifier>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run an interactive timer; events are printed as JSON lines
    ///
    /// Commands on stdin: start, pause, toggle, reset, preset <id>,
    /// custom <mode> <minutes>, status, quit. When stdin closes, a running
    /// countdown keeps going until it completes or is interrupted.
    Run {
        /// Preset to select before starting
        #[arg(long)]
        preset: Option<String>,
        /// Start the countdown immediately
        #[arg(long)]
        start: bool,
    },
    /// Print the initial timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> CliResult {
    let ctx = Context::open()?;
    let options = DriverOptions::from_config(&ctx.config);
    let mut driver = TimerDriver::new(ctx.ledger(), StderrNotifier, ctx.clock.clone(), options);

    match action {
        TimerAction::Run { preset, start } => {
            if let Some(id) = preset {
                driver.dispatch(Command::ChangePreset(id))?;
            }
            if start {
                driver.dispatch(Command::Start)?;
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_loop(&mut driver))?;
        }
        TimerAction::Status => {
            print_json(&driver.snapshot())?;
        }
    }
    Ok(())
}

async fn run_loop(driver: &mut Driver<'_>) -> CliResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    flush_events(driver)?;

    let mut stdin_open = true;

    loop {
        // With stdin closed, keep counting down until the timer goes idle.
        if !stdin_open && !driver.state().running {
            break;
        }
        tokio::select! {
            _ = driver.next_tick() => {
                driver.tick()?;
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        if !handle_line(driver, line.trim())? {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
        flush_events(driver)?;
    }

    driver.shutdown()?;
    flush_events(driver)
}

/// Returns `false` when the loop should stop.
fn handle_line(driver: &mut Driver<'_>, line: &str) -> Result<bool, Box<dyn std::error::Error>> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        None => return Ok(true),
        Some("quit" | "exit" | "q") => return Ok(false),
        Some("status") => {
            println!("{}", serde_json::to_string(&driver.snapshot())?);
            return Ok(true);
        }
        Some("start") => Command::Start,
        Some("pause" | "stop") => Command::Pause,
        Some("toggle") => Command::Toggle,
        Some("reset") => Command::Reset,
        Some("preset") => match words.next() {
            Some(id) => Command::ChangePreset(id.to_string()),
            None => {
                eprintln!("usage: preset <id>");
                return Ok(true);
            }
        },
        Some("custom") => {
            let mode = words.next().map(str::parse::<TimerMode>);
            let minutes = words.next().map(str::parse::<u32>);
            match (mode, minutes) {
                (Some(Ok(mode)), Some(Ok(minutes))) => {
                    Command::ChangeCustomDuration { mode, minutes }
                }
                _ => {
                    eprintln!("usage: custom <work|shortBreak|longBreak> <minutes>");
                    return Ok(true);
                }
            }
        }
        Some(other) => {
            eprintln!("unknown command: {other}");
            return Ok(true);
        }
    };

    // Rejections were already reported through the notifier.
    if let Err(e) = driver.dispatch(command) {
        tracing::debug!(error = %e, "command rejected");
    }
    Ok(true)
}

fn flush_events(driver: &mut Driver<'_>) -> CliResult {
    for event in driver.drain_events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

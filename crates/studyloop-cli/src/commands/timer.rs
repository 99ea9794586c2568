use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use studyloop_core::storage::{Config, TomlConfigStore};
use studyloop_core::{
    Database, Event, HttpRecorder, Notifier, NullNotifier, SessionRecorder, TerminalBell,
    TimerEngine, TimerService,
};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer in the foreground until interrupted
    Run {
        /// Start the next phase automatically at every boundary
        #[arg(long)]
        auto: bool,
        /// Disable the terminal bell
        #[arg(long)]
        mute: bool,
        /// Label the work session (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Notes attached to the work session
        #[arg(long)]
        notes: Option<String>,
        /// Stop after this many completed work sessions
        #[arg(long)]
        sessions: Option<u32>,
    },
    /// Print the initial timer state for the configured durations as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Status => {
            let config = Config::load()?;
            let engine = TimerEngine::new(config.timer);
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
            Ok(())
        }
        TimerAction::Run {
            auto,
            mute,
            tags,
            notes,
            sessions,
        } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_loop(auto, mute, tags, notes, sessions))
        }
    }
}

async fn run_loop(
    auto: bool,
    mute: bool,
    tags: Vec<String>,
    notes: Option<String>,
    sessions: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let store = Arc::new(TomlConfigStore::open()?);
    let recorder: Arc<dyn SessionRecorder> = match &config.recorder.endpoint {
        Some(endpoint) => Arc::new(HttpRecorder::new(
            endpoint,
            config.recorder.auth_token.clone(),
        )?),
        None => Arc::new(Database::open()?),
    };
    let notifier: Arc<dyn Notifier> = if mute || !config.notifications.enabled {
        Arc::new(NullNotifier)
    } else {
        Arc::new(TerminalBell)
    };

    let service = Arc::new(TimerService::new(store, recorder, notifier)?);
    for tag in &tags {
        service.add_tag(tag);
    }
    if let Some(notes) = notes {
        service.set_notes(notes);
    }

    let mut rx = service.subscribe();
    service.run_ticker();
    service.start();
    print_remaining(&service.snapshot())?;

    let mut completed = 0u32;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            event = rx.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(_) => break,
                };
                match event {
                    Event::Tick { .. } => print_remaining(&event)?,
                    Event::WorkCompleted { next_phase, .. } => {
                        completed += 1;
                        println!("\rWork session {completed} complete -> {}      ", next_phase.label());
                        if sessions.is_some_and(|target| completed >= target) {
                            break;
                        }
                        resume(&service, auto).await?;
                    }
                    Event::BreakCompleted { .. } => {
                        println!("\rBreak over -> back to work      ");
                        resume(&service, auto).await?;
                    }
                    Event::SessionRecordFailed { message, .. } => {
                        eprintln!("could not save session: {message}");
                    }
                    _ => {}
                }
            }
        }
    }

    // Give an in-flight session record a moment to land before the
    // runtime goes away.
    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    service.shutdown();
    Ok(())
}

async fn resume(service: &Arc<TimerService>, auto: bool) -> std::io::Result<()> {
    if !auto {
        println!("press Enter to start the next phase");
        wait_for_enter().await?;
    }
    service.start();
    Ok(())
}

async fn wait_for_enter() -> std::io::Result<()> {
    use tokio::io::AsyncBufReadExt;

    let mut line = String::new();
    let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await?;
    Ok(())
}

fn print_remaining(event: &Event) -> std::io::Result<()> {
    let (phase, seconds_remaining) = match event {
        Event::Tick {
            phase,
            seconds_remaining,
            ..
        }
        | Event::StateSnapshot {
            phase,
            seconds_remaining,
            ..
        } => (*phase, *seconds_remaining),
        _ => return Ok(()),
    };
    let mut stdout = std::io::stdout();
    write!(
        stdout,
        "\r{:<12} {:02}:{:02}  ",
        phase.label(),
        seconds_remaining / 60,
        seconds_remaining % 60
    )?;
    stdout.flush()
}

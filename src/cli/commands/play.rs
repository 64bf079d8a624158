//! Interactive listening session.

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::prompt::{prompt, prompt_settings, spawn_line_reader};
use crate::config::{self, Config};
use crate::player::{DeviceEvent, PlaybackDevice};
use crate::scheduler::{Command, NextView, Notice, Phase, Scheduler, SessionView};
use crate::{recommend, resolve};

const HELP: &str = "\
Commands:
  n, next        skip to the next track
  r, reroll      pick a different next track
  p, pause       pause / resume
  s <percent>    seek within the current track
  m <mood>       change the mood
  i, info        show what is playing
  h, help        show this help
  q, quit        stop and exit";

/// How a session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Quit,
    CredentialsRejected,
}

/// One line of listener input.
#[derive(Debug, PartialEq)]
enum Input {
    Empty,
    Command(Command),
    Mood(String),
    Info,
    Help,
    Quit,
    Unknown,
}

/// Start a listening session for `mood`, prompting for anything missing.
pub fn cmd_play(mood: Option<String>) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(play(mood));
    // The stdin reader may still be parked in a blocking read
    rt.shutdown_background();
    result
}

async fn play(mood: Option<String>) -> anyhow::Result<()> {
    let mut lines = spawn_line_reader();
    let mut config = config::load();

    let mood = match mood {
        Some(mood) => mood,
        None => loop {
            let Some(line) = prompt(&mut lines, "Mood: ").await else {
                return Ok(());
            };
            if !line.trim().is_empty() {
                break line.trim().to_string();
            }
        },
    };

    loop {
        if !config.is_complete() {
            println!(
                "Missing API keys for: {}",
                config.missing_credentials().join(", ")
            );
            prompt_settings(&mut lines, &mut config).await?;
        }

        match run_session(&config, &mood, &mut lines).await? {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::CredentialsRejected => {
                println!("An API key was rejected. Please re-enter your keys.");
                prompt_settings(&mut lines, &mut config).await?;
                info!("Restarting session with new settings");
            }
        }
    }
}

/// Run one scheduler until the listener quits or credentials are rejected.
async fn run_session(
    config: &Config,
    mood: &str,
    lines: &mut mpsc::Receiver<String>,
) -> anyhow::Result<SessionEnd> {
    let recommender = recommend::build(config)?;
    let resolver = resolve::build(config)?;

    let (device_tx, device_rx) = mpsc::channel(32);
    let device = spawn_device(config, device_tx)
        .await
        .context("Could not start the player (is mpv installed?)")?;

    let (scheduler, mut handle) =
        Scheduler::new(&config.scheduler, recommender, resolver, device);
    let scheduler_task = tokio::spawn(scheduler.run(device_rx));

    handle
        .commands
        .send(Command::StartSession(mood.to_string()))?;
    println!("{}", HELP);

    let mut shown = handle.view.borrow().clone();
    let end = loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    break SessionEnd::Quit;
                };
                let command = match parse_input(&line) {
                    Input::Empty => continue,
                    Input::Quit => break SessionEnd::Quit,
                    Input::Help => {
                        println!("{}", HELP);
                        continue;
                    }
                    Input::Info => {
                        print_info(&handle.view.borrow());
                        continue;
                    }
                    Input::Unknown => {
                        println!("Unknown command, type 'h' for help");
                        continue;
                    }
                    Input::Mood(mood) if handle.view.borrow().phase == Phase::Idle => {
                        Command::StartSession(mood)
                    }
                    Input::Mood(mood) => Command::ChangeMood(mood),
                    Input::Command(command) => command,
                };
                if handle.commands.send(command).is_err() {
                    break SessionEnd::Quit;
                }
            }
            changed = handle.view.changed() => {
                if changed.is_err() {
                    break SessionEnd::Quit;
                }
                let view = handle.view.borrow_and_update().clone();
                if !view.same_display(&shown) {
                    print_view(&view);
                }
                shown = view;
            }
            Some(Notice::CredentialsRejected) = handle.notices.recv() => {
                break SessionEnd::CredentialsRejected;
            }
            _ = tokio::signal::ctrl_c() => break SessionEnd::Quit,
        }
    };

    // Closing the command channel stops the scheduler and the player with it
    drop(handle);
    match scheduler_task.await {
        Ok(result) => {
            if let Err(e) = result {
                warn!("Player stopped: {}", e);
                return Err(e.into());
            }
        }
        Err(e) => return Err(e.into()),
    }
    Ok(end)
}

#[cfg(unix)]
async fn spawn_device(
    config: &Config,
    events: mpsc::Sender<DeviceEvent>,
) -> anyhow::Result<Box<dyn PlaybackDevice>> {
    let device = crate::player::mpv::MpvDevice::spawn(&config.player, events).await?;
    Ok(Box::new(device))
}

#[cfg(not(unix))]
async fn spawn_device(
    _config: &Config,
    _events: mpsc::Sender<DeviceEvent>,
) -> anyhow::Result<Box<dyn PlaybackDevice>> {
    anyhow::bail!("The mpv player backend needs a Unix platform")
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "n" | "next" => Input::Command(Command::Skip),
        "r" | "reroll" => Input::Command(Command::Reroll),
        "p" | "pause" => Input::Command(Command::TogglePause),
        "s" | "seek" => match rest.trim_end_matches('%').parse::<f32>() {
            Ok(percent) if percent.is_finite() => Input::Command(Command::Seek(percent / 100.0)),
            _ => Input::Unknown,
        },
        "m" | "mood" if !rest.is_empty() => Input::Mood(rest.to_string()),
        "i" | "info" => Input::Info,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        _ => Input::Unknown,
    }
}

fn next_label(next: &NextView) -> String {
    match next {
        NextView::Empty => "Waiting".to_string(),
        NextView::Loading => "Searching...".to_string(),
        NextView::Ready(track) => track.to_string(),
        NextView::Error(hint) => hint.clone(),
    }
}

fn print_view(view: &SessionView) {
    match &view.now {
        Some(track) if view.paused => println!("Now:  {} [paused]", track),
        Some(track) => println!("Now:  {}", track),
        None => println!("Now:  ---"),
    }
    if let Some(status) = &view.status {
        println!("      {}", status);
    }
    if view.phase != Phase::Idle {
        println!("Next: {}", next_label(&view.next));
    }
}

fn print_info(view: &SessionView) {
    println!("Mood: {}", view.mood);
    print_view(view);
    if let Some(progress) = &view.progress {
        println!(
            "      {} / {} ({:.0}%)",
            progress.position_str(),
            progress.duration_str(),
            progress.fraction() * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;

    #[test]
    fn test_parse_playback_commands() {
        assert_eq!(parse_input("n"), Input::Command(Command::Skip));
        assert_eq!(parse_input(" NEXT "), Input::Command(Command::Skip));
        assert_eq!(parse_input("r"), Input::Command(Command::Reroll));
        assert_eq!(parse_input("pause"), Input::Command(Command::TogglePause));
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input(""), Input::Empty);
        assert_eq!(parse_input("dance"), Input::Unknown);
    }

    #[test]
    fn test_parse_seek_percent() {
        assert_eq!(parse_input("s 50"), Input::Command(Command::Seek(0.5)));
        assert_eq!(parse_input("s 25%"), Input::Command(Command::Seek(0.25)));
        assert_eq!(parse_input("s half"), Input::Unknown);
        assert_eq!(parse_input("s"), Input::Unknown);
    }

    #[test]
    fn test_parse_mood_keeps_words() {
        assert_eq!(
            parse_input("m  rainy   bossa nova "),
            Input::Mood("rainy   bossa nova".to_string())
        );
        assert_eq!(parse_input("m"), Input::Unknown);
    }

    #[test]
    fn test_next_label() {
        assert_eq!(next_label(&NextView::Loading), "Searching...");
        assert_eq!(
            next_label(&NextView::Ready(Track::new("Naima", "John Coltrane", Some(1960)))),
            "John Coltrane - Naima (1960)"
        );
        assert_eq!(
            next_label(&NextView::Error("Failed - press reroll".into())),
            "Failed - press reroll"
        );
    }
}

//! Clip playback: the media collaborator of the real-time driver.
//!
//! The sequencer never talks to a player directly. The driver asks a
//! [`MediaPlayer`] to play a clip and turns the completion callback into a
//! `MediaEvent`. Dropping the returned [`Playback`] stops the clip and
//! guarantees the callback won't run.

use std::io;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, warn};

use crate::task::Task;
use crate::types::{ClipId, ClipSource};

/// How a clip ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Failed(String),
}

/// Completion callback, invoked at most once from a background thread.
pub type OnDone = Box<dyn FnOnce(PlaybackOutcome) + Send + 'static>;

/// A clip being played. Stops the clip when dropped.
pub struct Playback {
    _task: Task,
}

/// Anything that can play a clip.
pub trait MediaPlayer {
    /// Start playing `source`.
    ///
    /// # Errors
    /// Returns an error if playback could not start at all (player missing,
    /// permission denied). The caller logs it and carries on.
    fn play(&self, clip: ClipId, source: &ClipSource, on_done: OnDone) -> io::Result<Playback>;
}

// ============================================================================
// EXTERNAL PLAYER PROCESS
// ============================================================================

/// How often a running player process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Plays clips by spawning an external player, one process per clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl Default for CommandPlayer {
    /// `ffplay` without a window, exiting when the clip ends.
    fn default() -> Self {
        CommandPlayer {
            program: "ffplay".to_string(),
            args: ["-nodisp", "-autoexit", "-loglevel", "quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandPlayer {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line ("mpv --no-video").
    /// The clip location is appended as the last argument.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandPlayer::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl MediaPlayer for CommandPlayer {
    fn play(&self, clip: ClipId, source: &ClipSource, on_done: OnDone) -> io::Result<Playback> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&source.location)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        debug!(%clip, program = %self.program, location = %source.location, "player started");

        Ok(Playback {
            _task: Task::spawn(move |cancel| {
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) if status.success() => {
                            on_done(PlaybackOutcome::Finished);
                            return;
                        }
                        Ok(Some(status)) => {
                            warn!(%clip, %status, "player exited with an error");
                            on_done(PlaybackOutcome::Failed(format!("player exited with {}", status)));
                            return;
                        }
                        Ok(None) => {
                            if cancel.sleep(POLL_INTERVAL) {
                                // Stopped by the owner: no callback
                                let _ = child.kill();
                                let _ = child.wait();
                                debug!(%clip, "player stopped");
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(%clip, error = %e, "lost track of player process");
                            on_done(PlaybackOutcome::Failed(e.to_string()));
                            return;
                        }
                    }
                }
            }),
        })
    }
}

// ============================================================================
// SILENT PLAYBACK
// ============================================================================

/// Plays nothing; reports each clip finished after its nominal length.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl MediaPlayer for SilentPlayer {
    fn play(&self, clip: ClipId, source: &ClipSource, on_done: OnDone) -> io::Result<Playback> {
        let length = source.length();
        debug!(%clip, ?length, "silent playback");
        Ok(Playback {
            _task: Task::after(length, move || on_done(PlaybackOutcome::Finished)),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn source(length_ms: u64) -> ClipSource {
        ClipSource {
            location: "clip.mp3".into(),
            length_ms: Some(length_ms),
        }
    }

    fn channel_callback() -> (OnDone, mpsc::Receiver<PlaybackOutcome>) {
        let (tx, rx) = mpsc::channel();
        let on_done: OnDone = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });
        (on_done, rx)
    }

    #[test]
    fn command_line_splits_program_and_args() {
        let player = CommandPlayer::from_command_line("mpv --no-video --really-quiet").unwrap();
        assert_eq!(player.program(), "mpv");
        assert_eq!(
            player,
            CommandPlayer::new("mpv", vec!["--no-video".into(), "--really-quiet".into()])
        );
    }

    #[test]
    fn blank_command_line_is_none() {
        assert_eq!(CommandPlayer::from_command_line("   "), None);
    }

    #[test]
    fn default_player_is_ffplay() {
        assert_eq!(CommandPlayer::default().program(), "ffplay");
    }

    #[test]
    fn missing_player_fails_to_start() {
        let player = CommandPlayer::new("ringflow-no-such-player", vec![]);
        let (on_done, _rx) = channel_callback();
        let result = player.play(ClipId::Ringing, &source(10), on_done);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn successful_player_exit_reports_finished() {
        let player = CommandPlayer::new("true", vec![]);
        let (on_done, rx) = channel_callback();
        let _playback = player.play(ClipId::InCall, &source(10), on_done).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(10)),
            Ok(PlaybackOutcome::Finished)
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_player_exit_reports_failed() {
        let player = CommandPlayer::new("false", vec![]);
        let (on_done, rx) = channel_callback();
        let _playback = player.play(ClipId::EndCall, &source(10), on_done).unwrap();
        match rx.recv_timeout(Duration::from_secs(10)) {
            Ok(PlaybackOutcome::Failed(reason)) => assert!(reason.contains("exited")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn dropping_playback_stops_player_without_callback() {
        let player = CommandPlayer::new("sleep", vec![]);
        let (on_done, rx) = channel_callback();
        // "sleep clip.mp3" would fail fast, so pass a duration as location
        let long = ClipSource {
            location: "30".into(),
            length_ms: None,
        };
        let playback = player.play(ClipId::Ringing, &long, on_done).unwrap();
        drop(playback);
        assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }

    #[test]
    fn silent_player_finishes_after_nominal_length() {
        let (on_done, rx) = channel_callback();
        let _playback = SilentPlayer.play(ClipId::Ringing, &source(5), on_done).unwrap();
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Ok(PlaybackOutcome::Finished)
        );
    }

    #[test]
    fn dropped_silent_playback_never_reports() {
        let (on_done, rx) = channel_callback();
        let playback = SilentPlayer
            .play(ClipId::Ringing, &source(30_000), on_done)
            .unwrap();
        drop(playback);
        assert_eq!(rx.try_recv(), Err(mpsc::TryRecvError::Disconnected));
    }
}

//! TUI effects boundary: event loop, terminal lifecycle, key mapping.
//!
//! This is the only module with side effects. It wires the pure layers
//! (sequencer, update, view) to the real terminal, real clocks and a real
//! media player.
//!
//! Architecture: producer threads feed a single mpsc channel.
//! - Key reader thread: forwards crossterm key events
//! - Timer, deadline and playback tasks: send sequencer events stamped
//!   with the activation that started them
//! The event loop consumes from the channel one event at a time.

use std::collections::HashMap;
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::flow::{Action, Activation, Effect, Event, MediaEvent, TimerId};
use crate::media::{MediaPlayer, OnDone, Playback, PlaybackOutcome};
use crate::report::Transcript;
use crate::task::Task;
use crate::types::{ClipId, Script, ScreenId};

use super::state::{App, AppEvent};
use super::update;
use super::view::render;

// ============================================================================
// KEY MAPPING
// ============================================================================

/// Map a crossterm key event to a semantic Action.
///
/// Returns None for keys that don't map to any action.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    // Ctrl+C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    match key.code {
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc | KeyCode::Char('d') => Some(Action::Decline),
        KeyCode::Char('x') => Some(Action::AlreadyPassed),
        KeyCode::Char('q') => Some(Action::Quit),

        // Quiz options
        KeyCode::Char(c @ '1'..='4') => Some(Action::Choose((c as u8 - b'1') as usize)),

        // In-call toggles
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('s') => Some(Action::ToggleSpeaker),

        KeyCode::Char('p') => Some(Action::Replay),

        _ => None,
    }
}

// ============================================================================
// TERMINAL LIFECYCLE
// ============================================================================

/// Set up the terminal for TUI mode.
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Install a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Best-effort terminal restoration
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// BACKGROUND THREADS
// ============================================================================

/// Spawn a thread that reads crossterm events and forwards key presses to the channel.
fn spawn_key_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(TermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break; // receiver dropped, TUI is shutting down
                    }
                }
                Ok(_) => {} // ignore releases, mouse, resize, etc.
                Err(_) => break,
            }
        }
    });
}

// ============================================================================
// SCREEN SCOPE
// ============================================================================

/// Everything the active screen has running in the background.
///
/// Dropping it cancels and joins every task, so nothing it started can
/// send another event afterwards.
#[derive(Default)]
struct ScreenScope {
    timers: HashMap<TimerId, Task>,
    deadlines: Vec<Task>,
    playback: Option<Playback>,
}

/// What effect execution needs besides the scope itself.
struct Effects<'a> {
    tx: &'a mpsc::Sender<AppEvent>,
    player: &'a dyn MediaPlayer,
    script: &'a Script,
    /// Activation the effects belong to.
    activation: Activation,
}

/// A one-shot send of `event` under `activation`.
fn notify(
    tx: mpsc::Sender<AppEvent>,
    activation: Activation,
    event: Event,
) -> impl FnOnce() + Send + 'static {
    move || {
        let _ = tx.send(AppEvent::Flow { activation, event });
    }
}

impl Effects<'_> {
    fn execute(&self, effects: Vec<Effect>, scope: &mut ScreenScope) {
        for effect in effects {
            match effect {
                Effect::Teardown => *scope = ScreenScope::default(),
                Effect::PlayClip(clip) => self.play(clip, scope),
                Effect::StartTimer { timer, period } => {
                    let tx = self.tx.clone();
                    let activation = self.activation;
                    let task = Task::every(period, move || {
                        tx.send(AppEvent::Flow {
                            activation,
                            event: Event::Tick(timer),
                        })
                        .is_ok()
                    });
                    scope.timers.insert(timer, task);
                }
                Effect::StopTimer(timer) => {
                    scope.timers.remove(&timer);
                }
                Effect::Schedule { to, after } => {
                    let fire = notify(self.tx.clone(), self.activation, Event::Deadline(to));
                    scope.deadlines.push(Task::after(after, fire));
                }
                Effect::Answered(answer) => {
                    info!(question = answer.question, option = answer.option, "answer recorded");
                }
                Effect::Quit => debug!("quit requested"),
            }
        }
    }

    /// Start a clip. A player that cannot start is reported back as a
    /// failed clip; the session carries on either way.
    fn play(&self, clip: ClipId, scope: &mut ScreenScope) {
        let tx = self.tx.clone();
        let activation = self.activation;
        let on_done: OnDone = Box::new(move |outcome| {
            let event = match outcome {
                PlaybackOutcome::Finished => MediaEvent::Finished(clip),
                PlaybackOutcome::Failed(reason) => MediaEvent::Failed(clip, reason),
            };
            let _ = tx.send(AppEvent::Flow {
                activation,
                event: Event::Media(event),
            });
        });

        match self.player.play(clip, self.script.clips.get(clip), on_done) {
            Ok(playback) => scope.playback = Some(playback),
            Err(e) => {
                warn!(%clip, error = %e, "playback blocked");
                let failed = Event::Media(MediaEvent::Failed(clip, e.to_string()));
                notify(self.tx.clone(), self.activation, failed)();
            }
        }
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Run an interactive session starting on `start`.
///
/// Sets up the terminal, runs the event loop until the user quits, and
/// returns the session transcript.
pub fn run(script: Script, player: &dyn MediaPlayer, start: ScreenId) -> io::Result<Transcript> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let mut app = App::new(script);
    let mut scope = ScreenScope::default();

    let (tx, rx) = mpsc::channel::<AppEvent>();
    spawn_key_reader(tx.clone());

    let started = Instant::now();
    let step = update::start(&mut app, start);
    let effects = Effects {
        tx: &tx,
        player,
        script: &app.script,
        activation: app.sequencer.activation(),
    };
    effects.execute(step.effects, &mut scope);

    loop {
        terminal.draw(|frame| render(&app, frame))?;

        if app.should_quit {
            break;
        }

        // Block on next event from any producer
        let event = match rx.recv() {
            Ok(e) => e,
            Err(_) => break, // all senders dropped
        };
        let at_ms = elapsed_ms(started);

        let step = match event {
            AppEvent::Key(key) => match map_key(key) {
                Some(action) => update::handle_action(&mut app, action, at_ms),
                None => continue,
            },
            AppEvent::Flow { activation, event } => {
                update::dispatch(&mut app, activation, event, at_ms)
            }
        };

        let effects = Effects {
            tx: &tx,
            player,
            script: &app.script,
            activation: app.sequencer.activation(),
        };
        effects.execute(step.effects, &mut scope);
    }

    // Stop every clip and timer before handing the terminal back
    drop(scope);
    restore_terminal()?;

    update::finish(&mut app, elapsed_ms(started));
    Ok(app.transcript)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SilentPlayer;
    use crate::script::default_script;
    use crate::types::ClipSource;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_maps_to_quit() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), Some(Action::Quit));
    }

    #[test]
    fn enter_confirms_and_d_declines() {
        assert_eq!(map_key(key(KeyCode::Enter)), Some(Action::Confirm));
        assert_eq!(map_key(key(KeyCode::Char('d'))), Some(Action::Decline));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(Action::Decline));
    }

    #[test]
    fn number_keys_choose_zero_based_options() {
        for n in 1..=4u8 {
            let code = KeyCode::Char((b'0' + n) as char);
            assert_eq!(map_key(key(code)), Some(Action::Choose((n - 1) as usize)));
        }
    }

    #[test]
    fn toggles_and_replay() {
        assert_eq!(map_key(key(KeyCode::Char('m'))), Some(Action::ToggleMute));
        assert_eq!(map_key(key(KeyCode::Char('s'))), Some(Action::ToggleSpeaker));
        assert_eq!(map_key(key(KeyCode::Char('p'))), Some(Action::Replay));
        assert_eq!(map_key(key(KeyCode::Char('x'))), Some(Action::AlreadyPassed));
    }

    #[test]
    fn unmapped_key_returns_none() {
        assert_eq!(map_key(key(KeyCode::Char('z'))), None);
        assert_eq!(map_key(key(KeyCode::Char('5'))), None);
    }

    // -- Effect execution --

    /// A player that can never start.
    struct BrokenPlayer;

    impl MediaPlayer for BrokenPlayer {
        fn play(&self, _: ClipId, _: &ClipSource, _: OnDone) -> io::Result<Playback> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no player"))
        }
    }

    #[test]
    fn blocked_playback_reports_failure_for_current_activation() {
        let script = default_script();
        let (tx, rx) = mpsc::channel();
        let effects = Effects {
            tx: &tx,
            player: &BrokenPlayer,
            script: &script,
            activation: Activation(3),
        };
        let mut scope = ScreenScope::default();
        effects.execute(vec![Effect::PlayClip(ClipId::Ringing)], &mut scope);

        match rx.try_recv() {
            Ok(AppEvent::Flow { activation, event }) => {
                assert_eq!(activation, Activation(3));
                assert_eq!(
                    event,
                    Event::Media(MediaEvent::Failed(ClipId::Ringing, "no player".into()))
                );
            }
            other => panic!("Expected a media failure, got {:?}", other),
        }
        assert!(scope.playback.is_none());
    }

    #[test]
    fn teardown_silences_running_timers() {
        let script = default_script();
        let (tx, rx) = mpsc::channel();
        let effects = Effects {
            tx: &tx,
            player: &SilentPlayer,
            script: &script,
            activation: Activation(1),
        };
        let mut scope = ScreenScope::default();
        effects.execute(
            vec![Effect::StartTimer {
                timer: TimerId::Progress,
                period: Duration::from_millis(2),
            }],
            &mut scope,
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        effects.execute(vec![Effect::Teardown], &mut scope);
        assert!(scope.timers.is_empty());
        // Whatever was queued before teardown, nothing arrives after
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn schedule_fires_deadline_once() {
        let script = default_script();
        let (tx, rx) = mpsc::channel();
        let effects = Effects {
            tx: &tx,
            player: &SilentPlayer,
            script: &script,
            activation: Activation(7),
        };
        let mut scope = ScreenScope::default();
        effects.execute(
            vec![Effect::Schedule {
                to: ScreenId::Checkout,
                after: Duration::from_millis(5),
            }],
            &mut scope,
        );
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(AppEvent::Flow { activation, event }) => {
                assert_eq!(activation, Activation(7));
                assert_eq!(event, Event::Deadline(ScreenId::Checkout));
            }
            other => panic!("Expected a deadline, got {:?}", other),
        }
    }
}

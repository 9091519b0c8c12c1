//! App-level bookkeeping around the sequencer: (App, event) → Step.
//!
//! No terminal, no threads. The event loop calls these and executes the
//! returned effects; everything else (transcript, quit flag) is settled
//! here so it can be tested without a terminal.

use crate::flow::{Action, Activation, Event, MediaEvent, Step};
use crate::report::Outcome;
use crate::types::ScreenId;

use super::state::App;

/// Enter the first screen.
pub fn start(app: &mut App, screen: ScreenId) -> Step {
    let step = app.sequencer.start_at(screen);
    app.transcript.record(0, &step);
    step
}

/// Feed an event produced under `activation` to the sequencer.
pub fn dispatch(app: &mut App, activation: Activation, event: Event, at_ms: u64) -> Step {
    if let Event::Media(MediaEvent::Failed(clip, reason)) = &event {
        if activation == app.sequencer.activation() {
            app.transcript.record_media_failure(at_ms, *clip, reason);
        }
    }

    let step = app.sequencer.dispatch(activation, event);
    app.transcript.record(at_ms, &step);

    if app.sequencer.is_finished() {
        app.should_quit = true;
    }
    step
}

/// A key action always belongs to the screen on display.
pub fn handle_action(app: &mut App, action: Action, at_ms: u64) -> Step {
    let activation = app.sequencer.activation();
    dispatch(app, activation, Event::User(action), at_ms)
}

/// Close the transcript once the terminal is released.
pub fn finish(app: &mut App, at_ms: u64) {
    let screen = app.sequencer.current();
    let outcome = if screen.is_terminal() {
        Outcome::Completed { screen }
    } else {
        Outcome::Quit { screen }
    };
    app.transcript.finish(at_ms, outcome);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Cause, Effect, TimerId};
    use crate::script::default_script;
    use crate::types::ClipId;

    fn started_at(screen: ScreenId) -> App {
        let mut app = App::new(default_script());
        start(&mut app, screen);
        app
    }

    #[test]
    fn start_records_launch_visit() {
        let app = started_at(ScreenId::Intro);
        assert_eq!(app.transcript.path(), vec![ScreenId::Intro]);
        assert_eq!(app.transcript.visits[0].cause, Cause::Launch);
    }

    #[test]
    fn key_action_moves_to_call_and_plays_ringing() {
        let mut app = started_at(ScreenId::Intro);
        let step = handle_action(&mut app, Action::Confirm, 1200);
        assert_eq!(app.sequencer.current(), ScreenId::Call);
        assert!(step.effects.contains(&Effect::PlayClip(ClipId::Ringing)));
        assert_eq!(app.transcript.entered_at(ScreenId::Call), Some(1200));
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = started_at(ScreenId::Truth);
        handle_action(&mut app, Action::Quit, 50);
        assert!(app.should_quit);
    }

    #[test]
    fn stale_tick_is_ignored() {
        let mut app = started_at(ScreenId::Final);
        let stale = app.sequencer.activation();
        handle_action(&mut app, Action::Quit, 10);

        let step = dispatch(&mut app, Activation(stale.0 + 5), Event::Tick(TimerId::Progress), 20);
        assert_eq!(step, Step::default());
    }

    #[test]
    fn current_media_failure_is_recorded_once() {
        let mut app = started_at(ScreenId::Call);
        let activation = app.sequencer.activation();
        let failed = Event::Media(MediaEvent::Failed(ClipId::Ringing, "not found".into()));

        dispatch(&mut app, activation, failed.clone(), 5);
        // Same failure from a screen that is already gone
        handle_action(&mut app, Action::Confirm, 6);
        dispatch(&mut app, activation, failed, 7);

        assert_eq!(app.transcript.media_failures.len(), 1);
        assert_eq!(app.transcript.media_failures[0].reason, "not found");
    }

    #[test]
    fn finish_on_terminal_screen_is_completion() {
        let mut app = started_at(ScreenId::Intro);
        handle_action(&mut app, Action::AlreadyPassed, 400);
        handle_action(&mut app, Action::Quit, 900);
        finish(&mut app, 900);
        assert_eq!(
            app.transcript.outcome,
            Some(Outcome::Completed {
                screen: ScreenId::AlreadyPassed
            })
        );
    }

    #[test]
    fn finish_mid_session_is_quit() {
        let mut app = started_at(ScreenId::Quiz);
        handle_action(&mut app, Action::Choose(1), 100);
        handle_action(&mut app, Action::Quit, 200);
        finish(&mut app, 200);
        assert_eq!(
            app.transcript.outcome,
            Some(Outcome::Quit {
                screen: ScreenId::Quiz
            })
        );
        assert_eq!(app.transcript.answers.len(), 1);
    }
}

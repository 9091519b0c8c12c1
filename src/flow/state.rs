//! Sequencer state algebra: pure types, zero effects.
//!
//! These types define the whole state space of the screen sequencer.
//! Screen variants carry only per-screen transient state (counters, toggles,
//! clip status); it is created on entry and dropped on exit, so nothing
//! carries over between screens.

use std::time::Duration;

use serde::Serialize;

use crate::types::{ClipId, QuizAnswer, ScreenId};

// ============================================================================
// ACTIVATIONS
// ============================================================================

/// Identity of one entry into a screen.
///
/// Bumped on every transition. Anything scheduled under an older activation
/// (ticks, deadlines, media signals) is stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Activation(pub u64);

impl Activation {
    pub fn next(self) -> Self {
        Activation(self.0 + 1)
    }
}

// ============================================================================
// SCREENS
// ============================================================================

/// Playback status of the clip owned by the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipStatus {
    Playing,
    Finished,
    /// The player could not play the clip. No auto-advance will happen.
    Failed,
}

/// Answers collected so far on the quiz screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizState {
    /// Index of the question being shown.
    pub current: usize,
    /// Answers in the order given.
    pub answers: Vec<QuizAnswer>,
}

/// The active screen with its per-screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Intro,

    /// Incoming call. Either the user answers, or the ringing clip ends and
    /// the call auto-advances. Never both: whichever exit fires first ends
    /// the activation, and the other arrives stale.
    Call {
        clip: ClipStatus,
    },

    InCall {
        clip: ClipStatus,
        elapsed_secs: u64,
        muted: bool,
        speaker: bool,
    },

    EndCall {
        clip: ClipStatus,
        elapsed_secs: u64,
        /// Percentage, clamped at 100.
        progress: u8,
    },

    Truth,

    Quiz(QuizState),

    /// Loading bar. Checkout follows once it reaches 100.
    Final {
        progress: u8,
    },

    Checkout,

    AlreadyPassed,
}

/// Default screen is Intro (used as placeholder during transitions).
impl Default for Screen {
    fn default() -> Self {
        Screen::Intro
    }
}

impl Screen {
    /// Fresh state for a screen that is being entered.
    pub fn fresh(id: ScreenId) -> Self {
        match id {
            ScreenId::Intro => Screen::Intro,
            ScreenId::Call => Screen::Call {
                clip: ClipStatus::Playing,
            },
            ScreenId::InCall => Screen::InCall {
                clip: ClipStatus::Playing,
                elapsed_secs: 0,
                muted: false,
                speaker: false,
            },
            ScreenId::EndCall => Screen::EndCall {
                clip: ClipStatus::Playing,
                elapsed_secs: 0,
                progress: 0,
            },
            ScreenId::Truth => Screen::Truth,
            ScreenId::Quiz => Screen::Quiz(QuizState::default()),
            ScreenId::Final => Screen::Final { progress: 0 },
            ScreenId::Checkout => Screen::Checkout,
            ScreenId::AlreadyPassed => Screen::AlreadyPassed,
        }
    }

    pub fn id(&self) -> ScreenId {
        match self {
            Screen::Intro => ScreenId::Intro,
            Screen::Call { .. } => ScreenId::Call,
            Screen::InCall { .. } => ScreenId::InCall,
            Screen::EndCall { .. } => ScreenId::EndCall,
            Screen::Truth => ScreenId::Truth,
            Screen::Quiz(_) => ScreenId::Quiz,
            Screen::Final { .. } => ScreenId::Final,
            Screen::Checkout => ScreenId::Checkout,
            Screen::AlreadyPassed => ScreenId::AlreadyPassed,
        }
    }

    /// Clip status for screens that own a clip.
    pub fn clip_status(&self) -> Option<ClipStatus> {
        match self {
            Screen::Call { clip, .. }
            | Screen::InCall { clip, .. }
            | Screen::EndCall { clip, .. } => Some(*clip),
            _ => None,
        }
    }
}

// ============================================================================
// INPUT
// ============================================================================

/// Semantic user action, decoupled from raw key events.
///
/// The transition function decides what each action means per screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Primary choice: start (intro), answer (call), "I want the truth".
    Confirm,
    /// Decline the incoming call.
    Decline,
    /// "Already passed" link on the intro screen.
    AlreadyPassed,
    /// Pick a quiz option (0-based).
    Choose(usize),
    ToggleMute,
    ToggleSpeaker,
    /// Play the screen's clip again after playback failed.
    Replay,
    Quit,
}

/// Which per-screen timer produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerId {
    /// 1 Hz elapsed-seconds counter.
    Elapsed,
    /// Bounded progress counter.
    Progress,
}

/// Signal from the media collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    Finished(ClipId),
    Failed(ClipId, String),
}

/// Everything the sequencer reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    User(Action),
    Tick(TimerId),
    Media(MediaEvent),
    /// A delayed navigation scheduled by this activation is due.
    Deadline(ScreenId),
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Side effect requested by the sequencer.
///
/// Pure code never executes these; drivers interpret them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel every timer, deadline and playback of the previous activation.
    /// Always the first effect of a transition.
    Teardown,
    PlayClip(ClipId),
    StartTimer { timer: TimerId, period: Duration },
    StopTimer(TimerId),
    /// Deliver `Event::Deadline(to)` after `after`.
    Schedule { to: ScreenId, after: Duration },
    /// A quiz answer was accepted.
    Answered(QuizAnswer),
    /// End the session.
    Quit,
}

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    /// Session start (or direct route access).
    Launch,
    /// The user chose it.
    User,
    /// A scheduled delay elapsed after a clip ended or a counter completed.
    Timed,
    /// The last quiz question was answered.
    QuizComplete,
}

/// Result of a pure state transition.
#[derive(Debug, PartialEq)]
pub enum Transition {
    /// Remain on this screen (possibly with updated state) and run effects.
    Stay { screen: Screen, effects: Vec<Effect> },
    /// Leave for another screen. `effects` run before the old screen is
    /// torn down.
    Goto {
        to: ScreenId,
        cause: Cause,
        effects: Vec<Effect>,
    },
    /// End the session. The screen is kept as it was so the last frame
    /// still shows it.
    Quit { screen: Screen },
}

impl Transition {
    /// Stay without side effects.
    pub fn stay(screen: Screen) -> Self {
        Transition::Stay {
            screen,
            effects: Vec::new(),
        }
    }

    /// Leave without parting effects.
    pub fn goto(to: ScreenId, cause: Cause) -> Self {
        Transition::Goto {
            to,
            cause,
            effects: Vec::new(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_next_increments() {
        assert_eq!(Activation(0).next(), Activation(1));
        assert!(Activation(3) > Activation(2));
    }

    #[test]
    fn fresh_screen_round_trips_its_id() {
        for id in ScreenId::ALL {
            assert_eq!(Screen::fresh(id).id(), id);
        }
    }

    #[test]
    fn fresh_call_is_playing() {
        assert_eq!(
            Screen::fresh(ScreenId::Call),
            Screen::Call {
                clip: ClipStatus::Playing,
            }
        );
    }

    #[test]
    fn fresh_quiz_starts_at_first_question() {
        match Screen::fresh(ScreenId::Quiz) {
            Screen::Quiz(quiz) => {
                assert_eq!(quiz.current, 0);
                assert!(quiz.answers.is_empty());
            }
            other => panic!("Expected Quiz, got {:?}", other),
        }
    }

    #[test]
    fn clip_status_only_on_call_screens() {
        assert_eq!(
            Screen::fresh(ScreenId::EndCall).clip_status(),
            Some(ClipStatus::Playing)
        );
        assert_eq!(Screen::fresh(ScreenId::Truth).clip_status(), None);
    }

    #[test]
    fn screen_default_is_intro() {
        assert_eq!(Screen::default(), Screen::Intro);
    }

    #[test]
    fn goto_helper_has_no_effects() {
        assert_eq!(
            Transition::goto(ScreenId::Quiz, Cause::User),
            Transition::Goto {
                to: ScreenId::Quiz,
                cause: Cause::User,
                effects: vec![],
            }
        );
    }

    #[test]
    fn stay_helper_has_no_effects() {
        assert_eq!(
            Transition::stay(Screen::Truth),
            Transition::Stay {
                screen: Screen::Truth,
                effects: vec![],
            }
        );
    }
}

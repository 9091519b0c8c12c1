//! Pure state transitions: (Screen, Event) → Transition.
//!
//! This is the core logic of the sequencer. Fully testable without a
//! terminal, a clock or a player. Each screen defines which events it
//! accepts; anything else returns the current screen unchanged (no-op).

use crate::types::{ClipId, QuizAnswer, ScreenId, OPTION_COUNT, QUESTION_COUNT};

use super::state::{
    Action, Cause, ClipStatus, Effect, Event, MediaEvent, QuizState, Screen, TimerId, Transition,
};
use super::timing::{
    advance_progress, CHECKOUT_DELAY, CLIP_ADVANCE_DELAY, ELAPSED_PERIOD,
    END_CALL_PROGRESS_PERIOD, END_CALL_PROGRESS_STEP, FINAL_PROGRESS_PERIOD,
    FINAL_PROGRESS_STEP, PROGRESS_MAX,
};

/// Pure state transition function.
///
/// Quit is honoured everywhere; every other event is interpreted by the
/// current screen.
pub fn update(screen: Screen, event: &Event) -> Transition {
    if *event == Event::User(Action::Quit) {
        return Transition::Quit { screen };
    }

    match screen {
        Screen::Intro => update_intro(event),
        Screen::Call { clip } => update_call(clip, event),
        Screen::InCall {
            clip,
            elapsed_secs,
            muted,
            speaker,
        } => update_in_call(clip, elapsed_secs, muted, speaker, event),
        Screen::EndCall {
            clip,
            elapsed_secs,
            progress,
        } => update_end_call(clip, elapsed_secs, progress, event),
        Screen::Truth => update_truth(event),
        Screen::Quiz(quiz) => update_quiz(quiz, event),
        Screen::Final { progress } => update_final(progress, event),
        // Terminal screens: nothing but quit, handled above
        Screen::Checkout | Screen::AlreadyPassed => Transition::stay(screen),
    }
}

/// Effects run when a screen is entered.
pub fn entry_effects(id: ScreenId) -> Vec<Effect> {
    let mut effects = Vec::new();

    if let Some(clip) = id.clip() {
        effects.push(Effect::PlayClip(clip));
    }

    match id {
        ScreenId::InCall => {
            effects.push(Effect::StartTimer {
                timer: TimerId::Elapsed,
                period: ELAPSED_PERIOD,
            });
        }
        ScreenId::EndCall => {
            effects.push(Effect::StartTimer {
                timer: TimerId::Elapsed,
                period: ELAPSED_PERIOD,
            });
            effects.push(Effect::StartTimer {
                timer: TimerId::Progress,
                period: END_CALL_PROGRESS_PERIOD,
            });
        }
        ScreenId::Final => {
            effects.push(Effect::StartTimer {
                timer: TimerId::Progress,
                period: FINAL_PROGRESS_PERIOD,
            });
        }
        _ => {}
    }

    effects
}

// ============================================================================
// CLIP HANDLING (shared by the three call screens)
// ============================================================================

/// Outcome of a clip-related event on a screen that owns `own`.
struct ClipUpdate {
    status: ClipStatus,
    effects: Vec<Effect>,
}

/// Apply media signals and replay requests to a screen's clip.
///
/// `advance_to` is where the screen goes once its clip finishes.
/// Returns `None` for events that don't concern the clip.
fn update_clip(
    status: ClipStatus,
    own: ClipId,
    advance_to: ScreenId,
    event: &Event,
) -> Option<ClipUpdate> {
    match event {
        Event::Media(MediaEvent::Finished(clip)) if *clip == own => {
            if status != ClipStatus::Playing {
                // Already consumed for this activation
                return Some(ClipUpdate {
                    status,
                    effects: Vec::new(),
                });
            }
            Some(ClipUpdate {
                status: ClipStatus::Finished,
                effects: vec![Effect::Schedule {
                    to: advance_to,
                    after: CLIP_ADVANCE_DELAY,
                }],
            })
        }
        Event::Media(MediaEvent::Failed(clip, _)) if *clip == own => {
            let status = if status == ClipStatus::Playing {
                ClipStatus::Failed
            } else {
                status
            };
            Some(ClipUpdate {
                status,
                effects: Vec::new(),
            })
        }
        Event::User(Action::Replay) if status == ClipStatus::Failed => Some(ClipUpdate {
            status: ClipStatus::Playing,
            effects: vec![Effect::PlayClip(own)],
        }),
        _ => None,
    }
}

/// A deadline is honoured only if this screen's clip finished and the
/// deadline targets the screen the clip advances to.
fn clip_deadline_due(status: ClipStatus, advance_to: ScreenId, event: &Event) -> bool {
    status == ClipStatus::Finished && *event == Event::Deadline(advance_to)
}

// ============================================================================
// PER-SCREEN HANDLERS
// ============================================================================

/// Intro: start the call, or skip to the already-passed page.
fn update_intro(event: &Event) -> Transition {
    match event {
        Event::User(Action::Confirm) => Transition::goto(ScreenId::Call, Cause::User),
        Event::User(Action::AlreadyPassed) => {
            Transition::goto(ScreenId::AlreadyPassed, Cause::User)
        }
        _ => Transition::stay(Screen::Intro),
    }
}

/// Call: answer and decline race against the ringing clip.
///
/// Every exit leaves the screen, and leaving ends the activation. The
/// activation is the single-fire token: the losing exit (a pending
/// auto-advance, or an answer after the advance) is dropped as stale.
fn update_call(clip: ClipStatus, event: &Event) -> Transition {
    if let Some(update) = update_clip(clip, ClipId::Ringing, ScreenId::InCall, event) {
        return Transition::Stay {
            screen: Screen::Call {
                clip: update.status,
            },
            effects: update.effects,
        };
    }

    match event {
        Event::User(Action::Confirm) => {
            // Teardown of this activation stops the clip and voids any
            // pending auto-advance.
            Transition::goto(ScreenId::InCall, Cause::User)
        }
        Event::User(Action::Decline) => Transition::goto(ScreenId::Intro, Cause::User),
        _ if clip_deadline_due(clip, ScreenId::InCall, event) => {
            Transition::goto(ScreenId::InCall, Cause::Timed)
        }
        _ => Transition::stay(Screen::Call { clip }),
    }
}

/// InCall: elapsed counter, presentational toggles, clip-driven exit.
fn update_in_call(
    clip: ClipStatus,
    elapsed_secs: u64,
    muted: bool,
    speaker: bool,
    event: &Event,
) -> Transition {
    let screen = |clip, elapsed_secs, muted, speaker| Screen::InCall {
        clip,
        elapsed_secs,
        muted,
        speaker,
    };

    if let Some(update) = update_clip(clip, ClipId::InCall, ScreenId::EndCall, event) {
        return Transition::Stay {
            screen: screen(update.status, elapsed_secs, muted, speaker),
            effects: update.effects,
        };
    }

    match event {
        Event::Tick(TimerId::Elapsed) => {
            Transition::stay(screen(clip, elapsed_secs + 1, muted, speaker))
        }
        Event::User(Action::ToggleMute) => {
            Transition::stay(screen(clip, elapsed_secs, !muted, speaker))
        }
        Event::User(Action::ToggleSpeaker) => {
            Transition::stay(screen(clip, elapsed_secs, muted, !speaker))
        }
        _ if clip_deadline_due(clip, ScreenId::EndCall, event) => {
            Transition::goto(ScreenId::EndCall, Cause::Timed)
        }
        _ => Transition::stay(screen(clip, elapsed_secs, muted, speaker)),
    }
}

/// EndCall: elapsed counter and progress counter run independently.
fn update_end_call(clip: ClipStatus, elapsed_secs: u64, progress: u8, event: &Event) -> Transition {
    if let Some(update) = update_clip(clip, ClipId::EndCall, ScreenId::Truth, event) {
        return Transition::Stay {
            screen: Screen::EndCall {
                clip: update.status,
                elapsed_secs,
                progress,
            },
            effects: update.effects,
        };
    }

    match event {
        Event::Tick(TimerId::Elapsed) => Transition::stay(Screen::EndCall {
            clip,
            elapsed_secs: elapsed_secs + 1,
            progress,
        }),
        Event::Tick(TimerId::Progress) => {
            let next = advance_progress(progress, END_CALL_PROGRESS_STEP);
            let effects = if next == PROGRESS_MAX {
                vec![Effect::StopTimer(TimerId::Progress)]
            } else {
                Vec::new()
            };
            Transition::Stay {
                screen: Screen::EndCall {
                    clip,
                    elapsed_secs,
                    progress: next,
                },
                effects,
            }
        }
        _ if clip_deadline_due(clip, ScreenId::Truth, event) => {
            Transition::goto(ScreenId::Truth, Cause::Timed)
        }
        _ => Transition::stay(Screen::EndCall {
            clip,
            elapsed_secs,
            progress,
        }),
    }
}

/// Truth: a single button leads to the quiz.
fn update_truth(event: &Event) -> Transition {
    match event {
        Event::User(Action::Confirm) => Transition::goto(ScreenId::Quiz, Cause::User),
        _ => Transition::stay(Screen::Truth),
    }
}

/// Quiz: one answer per question, then the final screen.
fn update_quiz(mut quiz: QuizState, event: &Event) -> Transition {
    let option = match event {
        Event::User(Action::Choose(option)) if *option < OPTION_COUNT => *option,
        _ => return Transition::stay(Screen::Quiz(quiz)),
    };

    if quiz.current >= QUESTION_COUNT {
        return Transition::stay(Screen::Quiz(quiz));
    }

    let answer = QuizAnswer {
        question: quiz.current,
        option,
    };
    quiz.answers.push(answer);
    let effects = vec![Effect::Answered(answer)];

    if quiz.current < QUESTION_COUNT - 1 {
        quiz.current += 1;
        Transition::Stay {
            screen: Screen::Quiz(quiz),
            effects,
        }
    } else {
        Transition::Goto {
            to: ScreenId::Final,
            cause: Cause::QuizComplete,
            effects,
        }
    }
}

/// Final: loading bar, then checkout after a short pause.
fn update_final(progress: u8, event: &Event) -> Transition {
    match event {
        Event::Tick(TimerId::Progress) if progress < PROGRESS_MAX => {
            let next = advance_progress(progress, FINAL_PROGRESS_STEP);
            let effects = if next == PROGRESS_MAX {
                vec![
                    Effect::StopTimer(TimerId::Progress),
                    Effect::Schedule {
                        to: ScreenId::Checkout,
                        after: CHECKOUT_DELAY,
                    },
                ]
            } else {
                Vec::new()
            };
            Transition::Stay {
                screen: Screen::Final { progress: next },
                effects,
            }
        }
        Event::Deadline(ScreenId::Checkout) if progress == PROGRESS_MAX => {
            Transition::goto(ScreenId::Checkout, Cause::Timed)
        }
        _ => Transition::stay(Screen::Final { progress }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

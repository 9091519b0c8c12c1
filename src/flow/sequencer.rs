//! The sequencer: owner of the single active screen.
//!
//! Wraps the pure [`update`] function with the bookkeeping a driver needs:
//! activation tokens, stale-event filtering, and teardown/entry effect
//! ordering on every transition.

use tracing::{debug, info};

use crate::types::ScreenId;

use super::state::{Activation, Cause, Effect, Event, Screen, Transition};
use super::update::{entry_effects, update};

/// A completed screen change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entered {
    /// Screen that was left. `None` on launch.
    pub from: Option<ScreenId>,
    pub to: ScreenId,
    pub cause: Cause,
    /// Activation of the screen just entered.
    pub activation: Activation,
}

/// What a driver must do after handing an event to the sequencer.
#[derive(Debug, Default, PartialEq)]
pub struct Step {
    /// Effects to execute, in order.
    pub effects: Vec<Effect>,
    /// Set when the event caused a screen change.
    pub entered: Option<Entered>,
}

impl Step {
    fn idle() -> Self {
        Step::default()
    }
}

/// State-machine context: the active screen and its activation.
#[derive(Debug)]
pub struct Sequencer {
    screen: Screen,
    activation: Activation,
    started: bool,
    finished: bool,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequencer {
    /// A sequencer resting on Intro. Call [`Sequencer::start`] before
    /// dispatching events.
    pub fn new() -> Self {
        Sequencer {
            screen: Screen::Intro,
            activation: Activation::default(),
            started: false,
            finished: false,
        }
    }

    /// Enter the first screen (Intro) and return its entry effects.
    pub fn start(&mut self) -> Step {
        self.start_at(ScreenId::Intro)
    }

    /// Enter an arbitrary screen first, as direct route access does.
    pub fn start_at(&mut self, id: ScreenId) -> Step {
        self.started = true;
        self.finished = false;
        self.enter(None, id, Cause::Launch, Vec::new())
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn current(&self) -> ScreenId {
        self.screen.id()
    }

    /// Activation that events must carry to be accepted.
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// True once the session quit.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handle one event produced under `activation`.
    ///
    /// Events from any other activation are stale (their screen is gone)
    /// and are dropped without touching state.
    pub fn dispatch(&mut self, activation: Activation, event: Event) -> Step {
        if !self.started || self.finished {
            debug!(?event, "sequencer not running, event dropped");
            return Step::idle();
        }
        if activation != self.activation {
            debug!(
                ?event,
                stale = activation.0,
                current = self.activation.0,
                "stale event dropped"
            );
            return Step::idle();
        }

        let screen = std::mem::take(&mut self.screen);
        let from = screen.id();

        match update(screen, &event) {
            Transition::Stay { screen, effects } => {
                self.screen = screen;
                Step {
                    effects,
                    entered: None,
                }
            }
            Transition::Goto { to, cause, effects } => self.enter(Some(from), to, cause, effects),
            Transition::Quit { screen } => {
                self.screen = screen;
                self.finished = true;
                info!(screen = %from, "session quit");
                Step {
                    effects: vec![Effect::Teardown, Effect::Quit],
                    entered: None,
                }
            }
        }
    }

    /// Bump the activation and install fresh state for `to`.
    ///
    /// Effect order: parting effects of the old screen, teardown, entry
    /// effects of the new screen.
    fn enter(
        &mut self,
        from: Option<ScreenId>,
        to: ScreenId,
        cause: Cause,
        mut effects: Vec<Effect>,
    ) -> Step {
        self.activation = self.activation.next();
        self.screen = Screen::fresh(to);

        effects.push(Effect::Teardown);
        effects.extend(entry_effects(to));

        match from {
            Some(from) => info!(%from, %to, ?cause, activation = self.activation.0, "screen transition"),
            None => info!(%to, activation = self.activation.0, "session started"),
        }

        Step {
            effects,
            entered: Some(Entered {
                from,
                to,
                cause,
                activation: self.activation,
            }),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

//! TUI state: the model the event loop owns and the view reads.
//!
//! The screen state machine itself lives in [`crate::flow`]. This module
//! only adds what the terminal session needs around it: the content to
//! display, the transcript being recorded, and the quit flag.

use crossterm::event::KeyEvent;

use crate::flow::{Activation, Event, Sequencer};
use crate::report::Transcript;
use crate::types::Script;

// ============================================================================
// APP EVENTS
// ============================================================================

/// Everything the event loop can receive from its channel.
///
/// Several producers feed a single mpsc channel:
/// - A key reader thread sends `Key` variants
/// - Timer, deadline and playback threads send `Flow` variants, stamped
///   with the activation of the screen that started them
#[derive(Debug)]
pub enum AppEvent {
    /// A terminal key event from the crossterm reader thread.
    Key(KeyEvent),
    /// A sequencer event produced in the background.
    Flow { activation: Activation, event: Event },
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Top-level TUI model.
#[derive(Debug)]
pub struct App {
    /// Owner of the active screen.
    pub sequencer: Sequencer,

    /// Content shown by the screens.
    pub script: Script,

    /// What happened so far.
    pub transcript: Transcript,

    /// Set to true when the app should exit on the next tick.
    pub should_quit: bool,
}

impl App {
    /// A session that has not entered its first screen yet.
    pub fn new(script: Script) -> Self {
        App {
            sequencer: Sequencer::new(),
            script,
            transcript: Transcript::default(),
            should_quit: false,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

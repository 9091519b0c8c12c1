//! Screen sequencer.
//!
//! Organized along the same boundaries as the TUI:
//! - `state`: pure data types (Screen, Event, Effect, Transition)
//! - `update`: pure transitions
//! - `timing`: pacing constants
//! - `sequencer`: the context object that owns the active screen

pub mod sequencer;
pub mod state;
pub mod timing;
pub mod update;

pub use sequencer::{Entered, Sequencer, Step};
pub use state::{Action, Activation, Cause, ClipStatus, Effect, Event, MediaEvent, Screen, TimerId};

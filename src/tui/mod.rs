//! TUI module for the interactive terminal session.
//!
//! Organized along FP/Unix boundaries:
//! - `state`: the App model and channel events
//! - `update`: app bookkeeping around the sequencer (pure)
//! - `view`: rendering (pure)
//! - `theme`: style constants
//! - `run`: event loop, terminal, timers and playback (effects)

pub mod run;
pub mod state;
pub mod theme;
pub mod update;
pub mod view;

//! ringflow: a scripted phone-call sequence driven by a screen state machine.

pub mod flow;
pub mod logging;
pub mod media;
pub mod report;
pub mod script;
pub mod sim;
pub mod task;
pub mod tui;
pub mod types;

//! TUI color semantics and style constants.
//!
//! Color semantics:
//! - Green: answer, progress complete
//! - Red: decline, hang up
//! - Yellow: attention (audio unavailable)
//! - Cyan: interactive elements (keybinding hints, options)
//! - Dim: de-emphasized (labels, clock)
//! - Bold: important (caller name, headlines)

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// SEMANTIC STYLES
// ============================================================================

/// Positive action / done: green.
pub const STYLE_ACCEPT: Style = Style::new().fg(Color::Green);

/// Negative action: red.
pub const STYLE_REJECT: Style = Style::new().fg(Color::Red);

/// Attention needed: yellow.
pub const STYLE_WARNING: Style = Style::new().fg(Color::Yellow);

/// Interactive element / keybinding hint: cyan.
pub const STYLE_INTERACTIVE: Style = Style::new().fg(Color::Cyan);

/// De-emphasized text: dark gray.
pub const STYLE_DIM: Style = Style::new().fg(Color::DarkGray);

/// Important text: bold.
pub const STYLE_IMPORTANT: Style = Style::new().add_modifier(Modifier::BOLD);

// ============================================================================
// UI ELEMENT STYLES
// ============================================================================

/// Title bar / header.
pub const STYLE_TITLE: Style = Style::new().fg(Color::White).add_modifier(Modifier::BOLD);

/// A toggle that is on (mute, speaker).
pub const STYLE_TOGGLE_ON: Style = Style::new().fg(Color::Black).bg(Color::Cyan);

/// Progress bar fill.
pub const STYLE_PROGRESS: Style = Style::new().fg(Color::Cyan);

/// Footer / help line.
pub const STYLE_HELP: Style = Style::new().fg(Color::DarkGray);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_styles_have_expected_colors() {
        assert_eq!(STYLE_ACCEPT.fg, Some(Color::Green));
        assert_eq!(STYLE_REJECT.fg, Some(Color::Red));
        assert_eq!(STYLE_WARNING.fg, Some(Color::Yellow));
        assert_eq!(STYLE_INTERACTIVE.fg, Some(Color::Cyan));
        assert_eq!(STYLE_DIM.fg, Some(Color::DarkGray));
    }

    #[test]
    fn important_style_is_bold() {
        assert!(STYLE_IMPORTANT.add_modifier.contains(Modifier::BOLD));
    }
}

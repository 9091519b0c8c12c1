//! Domain types for ringflow.
//!
//! Screen identifiers, clips, quiz answers and the script that feeds the
//! screens their content. Pure data: no I/O lives here.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of questions in every quiz.
pub const QUESTION_COUNT: usize = 5;

/// Number of answer options per question.
pub const OPTION_COUNT: usize = 4;

// ============================================================================
// SCREENS
// ============================================================================

/// Identity of a screen, independent of its transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenId {
    Intro,
    Call,
    InCall,
    EndCall,
    Truth,
    Quiz,
    Final,
    Checkout,
    AlreadyPassed,
}

impl ScreenId {
    /// Every screen, in route-table order.
    pub const ALL: [ScreenId; 9] = [
        ScreenId::Intro,
        ScreenId::Call,
        ScreenId::InCall,
        ScreenId::EndCall,
        ScreenId::Truth,
        ScreenId::Quiz,
        ScreenId::Final,
        ScreenId::Checkout,
        ScreenId::AlreadyPassed,
    ];

    /// Route path for direct access.
    pub fn route(self) -> &'static str {
        match self {
            ScreenId::Intro => "/",
            ScreenId::Call => "/call",
            ScreenId::InCall => "/in-call",
            ScreenId::EndCall => "/end-call",
            ScreenId::Truth => "/truth",
            ScreenId::Quiz => "/next-step",
            ScreenId::Final => "/final",
            ScreenId::Checkout => "/checkout",
            ScreenId::AlreadyPassed => "/already-passed",
        }
    }

    /// Resolve a route path. A missing leading slash is tolerated.
    pub fn from_route(route: &str) -> Option<ScreenId> {
        let trimmed = route.trim();
        let normalized = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        ScreenId::ALL
            .into_iter()
            .find(|id| id.route() == normalized)
    }

    /// Terminal screens accept nothing but quit.
    pub fn is_terminal(self) -> bool {
        matches!(self, ScreenId::Checkout | ScreenId::AlreadyPassed)
    }

    /// The clip a screen plays on entry, if any.
    pub fn clip(self) -> Option<ClipId> {
        match self {
            ScreenId::Call => Some(ClipId::Ringing),
            ScreenId::InCall => Some(ClipId::InCall),
            ScreenId::EndCall => Some(ClipId::EndCall),
            _ => None,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScreenId::Intro => "intro",
            ScreenId::Call => "call",
            ScreenId::InCall => "in-call",
            ScreenId::EndCall => "end-call",
            ScreenId::Truth => "truth",
            ScreenId::Quiz => "quiz",
            ScreenId::Final => "final",
            ScreenId::Checkout => "checkout",
            ScreenId::AlreadyPassed => "already-passed",
        };
        f.write_str(name)
    }
}

/// The three staged audio clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipId {
    /// Clip A, played while the phone rings.
    Ringing,
    /// Clip B, the conversation.
    InCall,
    /// Clip C, played after hang-up.
    EndCall,
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClipId::Ringing => "ringing",
            ClipId::InCall => "in-call",
            ClipId::EndCall => "end-call",
        };
        f.write_str(name)
    }
}

// ============================================================================
// QUIZ
// ============================================================================

/// One recorded quiz answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    /// Index of the question answered (0-based).
    pub question: usize,
    /// Index of the chosen option (0-based).
    pub option: usize,
}

// ============================================================================
// SCRIPT
// ============================================================================

/// Everything the screens display, plus where the clips come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Headline shown on the intro screen.
    pub headline: String,
    pub caller: Caller,
    pub reveal: Reveal,
    pub questions: Vec<Question>,
    pub clips: ClipSources,
}

/// Who is "calling".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub name: String,
    /// Short label under the avatar ("incoming call", ...).
    pub label: String,
}

/// Content of the truth screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reveal {
    pub headline: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Sources for the three clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSources {
    pub ringing: ClipSource,
    pub in_call: ClipSource,
    pub end_call: ClipSource,
}

impl ClipSources {
    pub fn get(&self, clip: ClipId) -> &ClipSource {
        match clip {
            ClipId::Ringing => &self.ringing,
            ClipId::InCall => &self.in_call,
            ClipId::EndCall => &self.end_call,
        }
    }
}

/// Where a clip lives and how long it nominally runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipSource {
    /// File path or URL handed to the player.
    pub location: String,
    /// Nominal length, used when nothing is actually played.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_ms: Option<u64>,
}

impl ClipSource {
    /// Fallback length for clips that don't declare one.
    pub const DEFAULT_LENGTH: Duration = Duration::from_secs(5);

    pub fn length(&self) -> Duration {
        self.length_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::DEFAULT_LENGTH)
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Output format for transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable pretty output.
    #[default]
    Human,
    /// Machine-readable JSON.
    Json,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_resolves_back_to_its_screen() {
        for id in ScreenId::ALL {
            assert_eq!(ScreenId::from_route(id.route()), Some(id));
        }
    }

    #[test]
    fn route_without_leading_slash_resolves() {
        assert_eq!(ScreenId::from_route("in-call"), Some(ScreenId::InCall));
        assert_eq!(ScreenId::from_route(" /final "), Some(ScreenId::Final));
    }

    #[test]
    fn unknown_route_is_none() {
        assert_eq!(ScreenId::from_route("/admin"), None);
    }

    #[test]
    fn quiz_keeps_its_original_route() {
        assert_eq!(ScreenId::Quiz.route(), "/next-step");
    }

    #[test]
    fn only_checkout_and_already_passed_are_terminal() {
        let terminal: Vec<ScreenId> = ScreenId::ALL
            .into_iter()
            .filter(|id| id.is_terminal())
            .collect();
        assert_eq!(terminal, vec![ScreenId::Checkout, ScreenId::AlreadyPassed]);
    }

    #[test]
    fn call_screens_map_to_their_clips() {
        assert_eq!(ScreenId::Call.clip(), Some(ClipId::Ringing));
        assert_eq!(ScreenId::InCall.clip(), Some(ClipId::InCall));
        assert_eq!(ScreenId::EndCall.clip(), Some(ClipId::EndCall));
        assert_eq!(ScreenId::Quiz.clip(), None);
    }

    #[test]
    fn clip_length_falls_back_to_default() {
        let source = ClipSource {
            location: "a.mp3".into(),
            length_ms: None,
        };
        assert_eq!(source.length(), ClipSource::DEFAULT_LENGTH);

        let source = ClipSource {
            location: "a.mp3".into(),
            length_ms: Some(1200),
        };
        assert_eq!(source.length(), Duration::from_millis(1200));
    }
}

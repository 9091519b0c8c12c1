//! Session transcripts: what happened, when, and how it ended.
//!
//! Both drivers feed a [`Transcript`] from the sequencer's steps.
//! Formatting is pure: (Transcript, OutputFormat) → String.

use serde::Serialize;

use crate::flow::{Cause, Effect, Step};
use crate::types::{ClipId, OutputFormat, QuizAnswer, ScreenId, QUESTION_COUNT};

// ============================================================================
// TRANSCRIPT
// ============================================================================

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Reached a terminal screen.
    Completed { screen: ScreenId },
    /// The user quit.
    Quit { screen: ScreenId },
    /// Nothing left that could move the session forward.
    Stalled { screen: ScreenId },
    /// Stopped by the time limit.
    TimedOut { screen: ScreenId },
}

/// One screen entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visit {
    /// Milliseconds since the session started.
    pub at_ms: u64,
    pub from: Option<ScreenId>,
    pub to: ScreenId,
    pub cause: Cause,
}

/// A clip that could not be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFailure {
    pub at_ms: u64,
    pub clip: ClipId,
    pub reason: String,
}

/// Complete record of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub outcome: Option<Outcome>,
    pub visits: Vec<Visit>,
    pub answers: Vec<QuizAnswer>,
    pub media_failures: Vec<MediaFailure>,
    /// Time of the last recorded event.
    pub duration_ms: u64,
}

impl Transcript {
    /// Record screen changes and quiz answers carried by a step.
    pub fn record(&mut self, at_ms: u64, step: &Step) {
        self.duration_ms = self.duration_ms.max(at_ms);

        for effect in &step.effects {
            if let Effect::Answered(answer) = effect {
                self.answers.push(*answer);
            }
        }

        if let Some(entered) = step.entered {
            self.visits.push(Visit {
                at_ms,
                from: entered.from,
                to: entered.to,
                cause: entered.cause,
            });
        }
    }

    pub fn record_media_failure(&mut self, at_ms: u64, clip: ClipId, reason: &str) {
        self.duration_ms = self.duration_ms.max(at_ms);
        self.media_failures.push(MediaFailure {
            at_ms,
            clip,
            reason: reason.to_string(),
        });
    }

    pub fn finish(&mut self, at_ms: u64, outcome: Outcome) {
        self.duration_ms = self.duration_ms.max(at_ms);
        self.outcome = Some(outcome);
    }

    /// Screens visited, in order.
    pub fn path(&self) -> Vec<ScreenId> {
        self.visits.iter().map(|v| v.to).collect()
    }

    /// Time the given screen was first entered.
    pub fn entered_at(&self, screen: ScreenId) -> Option<u64> {
        self.visits.iter().find(|v| v.to == screen).map(|v| v.at_ms)
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(transcript),
        OutputFormat::Json => format_json(transcript),
    }
}

fn format_seconds(ms: u64) -> String {
    format!("{}.{:03}s", ms / 1000, ms % 1000)
}

fn format_cause(cause: Cause) -> &'static str {
    match cause {
        Cause::Launch => "launch",
        Cause::User => "user",
        Cause::Timed => "timed",
        Cause::QuizComplete => "quiz complete",
    }
}

fn format_outcome(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(Outcome::Completed { screen }) => format!("completed on {}", screen),
        Some(Outcome::Quit { screen }) => format!("quit on {}", screen),
        Some(Outcome::Stalled { screen }) => format!("stalled on {}", screen),
        Some(Outcome::TimedOut { screen }) => format!("timed out on {}", screen),
        None => "in progress".to_string(),
    }
}

fn format_human(transcript: &Transcript) -> String {
    let mut out = String::new();

    if !transcript.visits.is_empty() {
        out.push_str("=== Screens ===\n");
        for visit in &transcript.visits {
            let from = visit
                .from
                .map(|s| s.to_string())
                .unwrap_or_else(|| "start".to_string());
            out.push_str(&format!(
                "  {:>9}  {} → {} ({})\n",
                format_seconds(visit.at_ms),
                from,
                visit.to,
                format_cause(visit.cause)
            ));
        }
        out.push('\n');
    }

    if !transcript.answers.is_empty() {
        out.push_str("=== Answers ===\n");
        for answer in &transcript.answers {
            out.push_str(&format!(
                "  Q{}: option {}\n",
                answer.question + 1,
                answer.option + 1
            ));
        }
        out.push('\n');
    }

    if !transcript.media_failures.is_empty() {
        out.push_str("=== Media Failures ===\n");
        for failure in &transcript.media_failures {
            out.push_str(&format!(
                "  {:>9}  {}: {}\n",
                format_seconds(failure.at_ms),
                failure.clip,
                failure.reason
            ));
        }
        out.push('\n');
    }

    out.push_str("=== Summary ===\n");
    out.push_str(&format!("Outcome:   {}\n", format_outcome(transcript.outcome)));
    out.push_str(&format!("Screens:   {}\n", transcript.visits.len()));
    out.push_str(&format!(
        "Answers:   {}/{}\n",
        transcript.answers.len(),
        QUESTION_COUNT
    ));
    out.push_str(&format!("Duration:  {}\n", format_seconds(transcript.duration_ms)));

    out
}

fn format_json(transcript: &Transcript) -> String {
    serde_json::to_string_pretty(transcript).unwrap_or_else(|e| {
        // Plain data with derived Serialize; cannot fail in practice
        panic!("Failed to serialize transcript to JSON: {}", e)
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Activation, Entered};

    fn sample_transcript() -> Transcript {
        Transcript {
            outcome: Some(Outcome::Completed {
                screen: ScreenId::Checkout,
            }),
            visits: vec![
                Visit {
                    at_ms: 0,
                    from: None,
                    to: ScreenId::Intro,
                    cause: Cause::Launch,
                },
                Visit {
                    at_ms: 1500,
                    from: Some(ScreenId::Intro),
                    to: ScreenId::Call,
                    cause: Cause::User,
                },
                Visit {
                    at_ms: 7500,
                    from: Some(ScreenId::Call),
                    to: ScreenId::InCall,
                    cause: Cause::Timed,
                },
            ],
            answers: vec![QuizAnswer {
                question: 0,
                option: 2,
            }],
            media_failures: vec![MediaFailure {
                at_ms: 7500,
                clip: ClipId::InCall,
                reason: "No such file or directory".to_string(),
            }],
            duration_ms: 41_250,
        }
    }

    // --- Recording ---

    #[test]
    fn record_collects_visits_and_answers() {
        let mut transcript = Transcript::default();
        let answer = QuizAnswer {
            question: 4,
            option: 1,
        };
        let step = Step {
            effects: vec![Effect::Answered(answer), Effect::Teardown],
            entered: Some(Entered {
                from: Some(ScreenId::Quiz),
                to: ScreenId::Final,
                cause: Cause::QuizComplete,
                activation: Activation(9),
            }),
        };
        transcript.record(30_000, &step);

        assert_eq!(transcript.answers, vec![answer]);
        assert_eq!(transcript.path(), vec![ScreenId::Final]);
        assert_eq!(transcript.entered_at(ScreenId::Final), Some(30_000));
        assert_eq!(transcript.duration_ms, 30_000);
    }

    #[test]
    fn idle_step_records_nothing() {
        let mut transcript = Transcript::default();
        transcript.record(10, &Step::default());
        assert!(transcript.visits.is_empty());
        assert!(transcript.answers.is_empty());
    }

    #[test]
    fn duration_never_goes_backwards() {
        let mut transcript = Transcript::default();
        transcript.record_media_failure(900, ClipId::Ringing, "blocked");
        transcript.finish(
            100,
            Outcome::Stalled {
                screen: ScreenId::Call,
            },
        );
        assert_eq!(transcript.duration_ms, 900);
    }

    // --- Human format ---

    #[test]
    fn human_format_lists_screens_with_causes() {
        let output = format_transcript(&sample_transcript(), OutputFormat::Human);
        assert!(output.contains("=== Screens ==="));
        assert!(output.contains("start → intro (launch)"));
        assert!(output.contains("1.500s  intro → call (user)"));
        assert!(output.contains("call → in-call (timed)"));
    }

    #[test]
    fn human_format_lists_answers_one_based() {
        let output = format_transcript(&sample_transcript(), OutputFormat::Human);
        assert!(output.contains("=== Answers ==="));
        assert!(output.contains("Q1: option 3"));
    }

    #[test]
    fn human_format_lists_media_failures() {
        let output = format_transcript(&sample_transcript(), OutputFormat::Human);
        assert!(output.contains("=== Media Failures ==="));
        assert!(output.contains("in-call: No such file or directory"));
    }

    #[test]
    fn human_format_includes_summary() {
        let output = format_transcript(&sample_transcript(), OutputFormat::Human);
        assert!(output.contains("=== Summary ==="));
        assert!(output.contains("Outcome:   completed on checkout"));
        assert!(output.contains("Screens:   3"));
        assert!(output.contains("Answers:   1/5"));
        assert!(output.contains("Duration:  41.250s"));
    }

    #[test]
    fn human_format_empty_transcript() {
        let output = format_transcript(&Transcript::default(), OutputFormat::Human);
        assert!(!output.contains("=== Screens"));
        assert!(!output.contains("=== Answers"));
        assert!(!output.contains("=== Media"));
        assert!(output.contains("Outcome:   in progress"));
    }

    // --- JSON format ---

    #[test]
    fn json_format_has_expected_fields() {
        let output = format_transcript(&sample_transcript(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("Invalid JSON");

        assert_eq!(parsed["outcome"]["kind"], "completed");
        assert_eq!(parsed["outcome"]["screen"], "checkout");
        assert_eq!(parsed["visits"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["visits"][0]["from"], serde_json::Value::Null);
        assert_eq!(parsed["visits"][2]["cause"], "timed");
        assert_eq!(parsed["visits"][2]["to"], "in_call");
        assert_eq!(parsed["answers"][0]["option"], 2);
        assert_eq!(parsed["media_failures"][0]["clip"], "in_call");
        assert_eq!(parsed["duration_ms"], 41_250);
    }

    #[test]
    fn json_format_empty_transcript() {
        let output = format_transcript(&Transcript::default(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["outcome"], serde_json::Value::Null);
        assert_eq!(parsed["visits"].as_array().unwrap().len(), 0);
    }
}

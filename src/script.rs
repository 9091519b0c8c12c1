//! Script loading: the built-in content, JSON files, validation.
//!
//! The sequencer relies on a fixed quiz shape (5 questions, 4 options each),
//! so every script goes through [`validate`] before it reaches a driver.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::types::{
    Caller, ClipSource, ClipSources, Question, Reveal, Script, OPTION_COUNT, QUESTION_COUNT,
};

/// Why a script could not be used.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid script {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("script must have exactly {expected} questions, found {found}")]
    QuestionCount { expected: usize, found: usize },

    #[error("question {question} must have exactly {expected} options, found {found}")]
    OptionCount {
        question: usize,
        expected: usize,
        found: usize,
    },

    #[error("empty text in {0}")]
    EmptyText(String),
}

/// Default location of the user's script file.
///
/// `<config dir>/ringflow/script.json`.
pub fn default_script_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ringflow").join("script.json"))
}

/// Pick the script for a session.
///
/// An explicit path must load. Without one, the user's config file is used
/// when present, and the built-in script otherwise.
pub fn resolve_script(path: Option<&Path>) -> Result<Script, ScriptError> {
    if let Some(path) = path {
        return load_script(path);
    }

    match default_script_path() {
        Some(candidate) if candidate.is_file() => load_script(&candidate),
        _ => {
            debug!("no user script found, using built-in script");
            Ok(default_script())
        }
    }
}

/// Read, parse and validate a JSON script file.
pub fn load_script(path: &Path) -> Result<Script, ScriptError> {
    let content = fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let script: Script = serde_json::from_str(&content).map_err(|source| ScriptError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&script)?;
    info!(path = %path.display(), "loaded script");
    Ok(script)
}

/// Check the quiz shape and that nothing shown on screen is blank.
pub fn validate(script: &Script) -> Result<(), ScriptError> {
    if script.questions.len() != QUESTION_COUNT {
        return Err(ScriptError::QuestionCount {
            expected: QUESTION_COUNT,
            found: script.questions.len(),
        });
    }

    for (i, question) in script.questions.iter().enumerate() {
        if question.prompt.trim().is_empty() {
            return Err(ScriptError::EmptyText(format!("question {} prompt", i)));
        }
        if question.options.len() != OPTION_COUNT {
            return Err(ScriptError::OptionCount {
                question: i,
                expected: OPTION_COUNT,
                found: question.options.len(),
            });
        }
        if let Some(j) = question.options.iter().position(|o| o.trim().is_empty()) {
            return Err(ScriptError::EmptyText(format!("question {} option {}", i, j)));
        }
    }

    let labelled = [
        ("headline", &script.headline),
        ("caller name", &script.caller.name),
        ("reveal headline", &script.reveal.headline),
    ];
    for (field, text) in labelled {
        if text.trim().is_empty() {
            return Err(ScriptError::EmptyText(field.to_string()));
        }
    }

    Ok(())
}

/// The script compiled into the binary.
pub fn default_script() -> Script {
    fn question(prompt: &str, options: [&str; OPTION_COUNT]) -> Question {
        Question {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    fn clip(location: &str, length_ms: u64) -> ClipSource {
        ClipSource {
            location: location.to_string(),
            length_ms: Some(length_ms),
        }
    }

    Script {
        headline: "Someone is trying to reach you. Answer a few questions before we go on."
            .to_string(),
        caller: Caller {
            name: "Unknown Caller".to_string(),
            label: "please pick up".to_string(),
        },
        reveal: Reveal {
            headline: "The whole story".to_string(),
            body: "You heard the call. Ready for the rest?".to_string(),
        },
        questions: vec![
            question(
                "How did you feel when the phone started ringing?",
                ["Curious", "Nervous", "Annoyed", "Excited"],
            ),
            question(
                "Do you usually answer calls from unknown numbers?",
                ["Always", "Sometimes", "Rarely", "Never"],
            ),
            question(
                "How much of the call did you hear?",
                ["All of it", "Most of it", "A little", "None"],
            ),
            question(
                "What would you do next?",
                ["Call back", "Wait", "Tell a friend", "Forget about it"],
            ),
            question(
                "Sum up the experience in one word.",
                ["Surprising", "Strange", "Fun", "Boring"],
            ),
        ],
        clips: ClipSources {
            // Remote assets; the player streams them
            ringing: clip("https://files.catbox.moe/ognhw7.mp3", 6_000),
            in_call: clip("https://files.catbox.moe/5wpges.mp3", 12_000),
            end_call: clip("https://files.catbox.moe/cp5kz3.mp3", 8_000),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_script(script: &Script) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        let json = serde_json::to_string_pretty(script).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_script_is_valid() {
        assert!(validate(&default_script()).is_ok());
    }

    #[test]
    fn load_round_trips_default_script() {
        let file = write_script(&default_script());
        let loaded = load_script(file.path()).unwrap();
        assert_eq!(loaded, default_script());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_script(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ScriptError::Io { .. })));
    }

    #[test]
    fn load_malformed_json_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ \"headline\": ").unwrap();
        let result = load_script(file.path());
        assert!(matches!(result, Err(ScriptError::Parse { .. })));
    }

    #[test]
    fn four_questions_are_rejected() {
        let mut script = default_script();
        script.questions.pop();
        match validate(&script) {
            Err(ScriptError::QuestionCount { expected, found }) => {
                assert_eq!(expected, 5);
                assert_eq!(found, 4);
            }
            other => panic!("Expected QuestionCount, got {:?}", other),
        }
    }

    #[test]
    fn three_options_are_rejected() {
        let mut script = default_script();
        script.questions[2].options.pop();
        match validate(&script) {
            Err(ScriptError::OptionCount { question, found, .. }) => {
                assert_eq!(question, 2);
                assert_eq!(found, 3);
            }
            other => panic!("Expected OptionCount, got {:?}", other),
        }
    }

    #[test]
    fn blank_option_is_rejected() {
        let mut script = default_script();
        script.questions[0].options[3] = "   ".into();
        assert!(matches!(validate(&script), Err(ScriptError::EmptyText(_))));
    }

    #[test]
    fn blank_caller_name_is_rejected() {
        let mut script = default_script();
        script.caller.name = String::new();
        match validate(&script) {
            Err(ScriptError::EmptyText(field)) => assert_eq!(field, "caller name"),
            other => panic!("Expected EmptyText, got {:?}", other),
        }
    }

    #[test]
    fn clip_length_is_optional_in_json() {
        let mut value = serde_json::to_value(default_script()).unwrap();
        value["clips"]["ringing"]
            .as_object_mut()
            .unwrap()
            .remove("length_ms");
        let script: Script = serde_json::from_value(value).unwrap();
        assert_eq!(script.clips.ringing.length_ms, None);
    }

    #[test]
    fn resolve_with_explicit_path_uses_it() {
        let mut custom = default_script();
        custom.caller.name = "Front Desk".into();
        let file = write_script(&custom);
        let resolved = resolve_script(Some(file.path())).unwrap();
        assert_eq!(resolved.caller.name, "Front Desk");
    }

    #[test]
    fn default_clips_do_not_depend_on_working_directory() {
        let clips = default_script().clips;
        for source in [&clips.ringing, &clips.in_call, &clips.end_call] {
            let location = source.location.as_str();
            assert!(
                location.starts_with("https://") || Path::new(location).is_absolute(),
                "clip location {} is relative",
                location
            );
        }
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = ScriptError::QuestionCount {
            expected: 5,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "script must have exactly 5 questions, found 2"
        );
    }
}

//! Pure rendering: map App state to ratatui widget trees.
//!
//! Each screen has a dedicated render function. The main `render()`
//! dispatches based on the active Screen variant. Widget-building
//! functions are pure (state in, widgets out); the only effect is
//! Frame::render_widget() which writes to the terminal buffer.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::flow::state::QuizState;
use crate::flow::{ClipStatus, Screen};
use crate::types::{Script, QUESTION_COUNT};

use super::state::App;
use super::theme;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render the active screen to the terminal frame.
pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();
    let screen = app.sequencer.screen();

    // Common layout: title bar at top, content in middle, help at bottom
    let chunks = Layout::vertical([
        Constraint::Length(1), // title
        Constraint::Min(0),    // content
        Constraint::Length(1), // help
    ])
    .split(area);

    frame.render_widget(render_title(screen), chunks[0]);
    frame.render_widget(render_help(screen), chunks[2]);

    let content_area = chunks[1];
    let script = &app.script;

    match screen {
        Screen::Intro => render_intro(script, frame, content_area),
        Screen::Call { clip, .. } => render_call(script, *clip, frame, content_area),
        Screen::InCall {
            clip,
            elapsed_secs,
            muted,
            speaker,
        } => render_in_call(
            script,
            *clip,
            *elapsed_secs,
            (*muted, *speaker),
            frame,
            content_area,
        ),
        Screen::EndCall {
            clip,
            elapsed_secs,
            progress,
        } => render_end_call(script, *clip, *elapsed_secs, *progress, frame, content_area),
        Screen::Truth => render_truth(script, frame, content_area),
        Screen::Quiz(quiz) => render_quiz(script, quiz, frame, content_area),
        Screen::Final { progress } => render_final(*progress, frame, content_area),
        Screen::Checkout => render_message(
            "  All done.",
            "  Thanks for taking part. Press q to leave.",
            frame,
            content_area,
        ),
        Screen::AlreadyPassed => render_message(
            "  Already completed.",
            "  You have been through this before. Press q to leave.",
            frame,
            content_area,
        ),
    }
}

// ============================================================================
// SHARED LAYOUT
// ============================================================================

/// Title bar showing the app name and screen-specific context.
fn render_title(screen: &Screen) -> Paragraph<'static> {
    let title_text = match screen {
        Screen::Intro => "ringflow",
        Screen::Call { .. } => "Incoming Call",
        Screen::InCall { .. } => "In Call",
        Screen::EndCall { .. } => "Call Ended",
        Screen::Truth => "The Truth",
        Screen::Quiz(_) => "Next Step",
        Screen::Final { .. } => "Almost There",
        Screen::Checkout => "Checkout",
        Screen::AlreadyPassed => "ringflow",
    };

    Paragraph::new(Line::from(vec![Span::styled(title_text, theme::STYLE_TITLE)]))
}

/// Help line showing available keybindings for the current screen.
///
/// Replay is only offered while the screen's clip has failed.
fn render_help(screen: &Screen) -> Paragraph<'static> {
    let mut keys = match screen {
        Screen::Intro => vec!["[Enter] start", "[x] already passed"],
        Screen::Call { .. } => vec!["[Enter] answer", "[d] decline"],
        Screen::InCall { .. } => vec!["[m] mute", "[s] speaker"],
        Screen::Truth => vec!["[Enter] I want the truth"],
        Screen::Quiz(_) => vec!["[1-4] choose"],
        Screen::EndCall { .. }
        | Screen::Final { .. }
        | Screen::Checkout
        | Screen::AlreadyPassed => Vec::new(),
    };
    if screen.clip_status() == Some(ClipStatus::Failed) {
        keys.push("[p] replay");
    }
    keys.push("[q] quit");

    Paragraph::new(Span::styled(keys.join("  "), theme::STYLE_HELP))
}

/// Format whole seconds as MM:SS. Minutes keep counting past 59.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Text progress bar: `[████░░░░] 50%`.
pub fn progress_bar(progress: u8, width: usize) -> String {
    let pct = usize::from(progress.min(100));
    let filled = pct * width / 100;
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        pct
    )
}

/// Notice for a clip that could not be played.
fn clip_notice(clip: ClipStatus) -> Option<Line<'static>> {
    (clip == ClipStatus::Failed).then(|| {
        Line::from(vec![
            Span::styled("  ⚠  audio unavailable  ", theme::STYLE_WARNING),
            Span::styled("[p] play", theme::STYLE_INTERACTIVE),
        ])
    })
}

fn caller_lines(script: &Script) -> Vec<Line<'_>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", script.caller.name),
            theme::STYLE_IMPORTANT,
        )),
        Line::from(Span::styled(
            format!("  {}", script.caller.label),
            theme::STYLE_DIM,
        )),
        Line::from(""),
    ]
}

// ============================================================================
// SCREENS
// ============================================================================

fn render_intro(script: &Script, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", script.headline),
            theme::STYLE_IMPORTANT,
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [Enter] ", theme::STYLE_INTERACTIVE),
            Span::raw("Start"),
        ]),
        Line::from(vec![
            Span::styled("  [x] ", theme::STYLE_INTERACTIVE),
            Span::styled("I already did this", theme::STYLE_DIM),
        ]),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_call(script: &Script, clip: ClipStatus, frame: &mut Frame, area: Rect) {
    let mut lines = caller_lines(script);
    lines.push(Line::from(vec![
        Span::styled("  ✆ Answer [Enter]", theme::STYLE_ACCEPT),
        Span::raw("     "),
        Span::styled("✕ Decline [d]", theme::STYLE_REJECT),
    ]));
    lines.extend(clip_notice(clip).into_iter().flat_map(|l| [Line::from(""), l]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_in_call(
    script: &Script,
    clip: ClipStatus,
    elapsed_secs: u64,
    (muted, speaker): (bool, bool),
    frame: &mut Frame,
    area: Rect,
) {
    let toggle = |label: &'static str, on: bool| {
        if on {
            Span::styled(label, theme::STYLE_TOGGLE_ON)
        } else {
            Span::styled(label, theme::STYLE_DIM)
        }
    };

    let mut lines = caller_lines(script);
    lines.push(Line::from(Span::styled(
        format!("  {}", format_clock(elapsed_secs)),
        theme::STYLE_IMPORTANT,
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("  "),
        toggle(" mute ", muted),
        Span::raw("  "),
        toggle(" speaker ", speaker),
    ]));
    lines.extend(clip_notice(clip).into_iter().flat_map(|l| [Line::from(""), l]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_end_call(
    script: &Script,
    clip: ClipStatus,
    elapsed_secs: u64,
    progress: u8,
    frame: &mut Frame,
    area: Rect,
) {
    let mut lines = caller_lines(script);
    lines.push(Line::from(vec![
        Span::styled("  Call ended  ", theme::STYLE_REJECT),
        Span::styled(format_clock(elapsed_secs), theme::STYLE_DIM),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("  {}", progress_bar(progress, 30)),
        theme::STYLE_PROGRESS,
    )));
    lines.extend(clip_notice(clip).into_iter().flat_map(|l| [Line::from(""), l]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_truth(script: &Script, frame: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", script.reveal.headline),
            theme::STYLE_IMPORTANT,
        )),
        Line::from(""),
    ];
    lines.extend(
        script
            .reveal
            .body
            .lines()
            .map(|l| Line::from(format!("  {}", l))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  [Enter] ", theme::STYLE_INTERACTIVE),
        Span::raw("I want the truth"),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_quiz(script: &Script, quiz: &QuizState, frame: &mut Frame, area: Rect) {
    let Some(question) = script.questions.get(quiz.current) else {
        let err = Paragraph::new("Question not found").style(theme::STYLE_REJECT);
        frame.render_widget(err, area);
        return;
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Question {} of {}", quiz.current + 1, QUESTION_COUNT),
            theme::STYLE_DIM,
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", question.prompt),
            theme::STYLE_IMPORTANT,
        )),
        Line::from(""),
    ];

    for (i, option) in question.options.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  [{}] ", i + 1), theme::STYLE_INTERACTIVE),
            Span::raw(option.clone()),
        ]));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_final(progress: u8, frame: &mut Frame, area: Rect) {
    let status = if progress >= 100 {
        Span::styled("  ✓ Ready", theme::STYLE_ACCEPT)
    } else {
        Span::styled("  Preparing your results...", theme::STYLE_INTERACTIVE)
    };

    let lines = vec![
        Line::from(""),
        Line::from(status),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", progress_bar(progress, 40)),
            theme::STYLE_PROGRESS,
        )),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_message(headline: &'static str, body: &'static str, frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(headline, theme::STYLE_ACCEPT)),
        Line::from(""),
        Line::from(Span::styled(body, theme::STYLE_DIM)),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// TESTS
// ============================================================================

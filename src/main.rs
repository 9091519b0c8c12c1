//! ringflow CLI
//!
//! Play a scripted phone-call sequence in the terminal, or simulate one.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::warn;

use ringflow::logging;
use ringflow::media::{CommandPlayer, MediaPlayer, SilentPlayer};
use ringflow::report::format_transcript;
use ringflow::script::{default_script, load_script, resolve_script};
use ringflow::sim::{CallResponse, IntroChoice, Plan, Simulation};
use ringflow::tui;
use ringflow::types::{OutputFormat, ScreenId, OPTION_COUNT};

#[derive(Parser)]
#[command(name = "ringflow")]
#[command(about = "A scripted phone-call sequence: ring, talk, reveal, quiz")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive session in the terminal
    Run {
        /// Script file (default: user config, else built-in)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Route to start on (e.g. /call, /next-step)
        #[arg(long, default_value = "/")]
        start: String,

        /// Player command line; the clip location is appended
        #[arg(long)]
        player: Option<String>,

        /// Don't play audio; clips "finish" after their nominal length
        #[arg(long, conflicts_with = "player")]
        silent: bool,

        /// Log file (default: under the user cache directory)
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Print the session transcript after exit
        #[arg(long)]
        transcript: bool,

        /// Transcript format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Run a whole session headlessly in virtual time
    Simulate {
        /// Script file (default: user config, else built-in)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Route to start on
        #[arg(long, default_value = "/")]
        start: String,

        /// Option picked for each question, 0-based (e.g. 0,1,2,3,0)
        #[arg(long, value_delimiter = ',')]
        answers: Vec<usize>,

        /// What to do when the phone rings
        #[arg(long, value_enum, default_value = "wait")]
        call: CallArg,

        /// Milliseconds before answering or declining
        #[arg(long, default_value_t = 2000)]
        answer_after: u64,

        /// Pick "already passed" on the intro screen
        #[arg(long)]
        already_passed: bool,

        /// Make every clip fail to play
        #[arg(long)]
        block_audio: bool,

        /// Stop after this many virtual milliseconds
        #[arg(long, default_value_t = 600_000)]
        limit_ms: u64,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Print the built-in script, or validate a script file
    Script {
        /// Script file to validate
        path: Option<PathBuf>,
    },

    /// List the screen routes
    Routes,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CallArg {
    Answer,
    Decline,
    Wait,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            script,
            start,
            player,
            silent,
            log_file,
            transcript,
            format,
        } => cmd_run(RunArgs {
            script,
            start,
            player,
            silent,
            log_file,
            transcript: transcript.then_some(format.into()),
        }),
        Commands::Simulate {
            script,
            start,
            answers,
            call,
            answer_after,
            already_passed,
            block_audio,
            limit_ms,
            format,
        } => {
            let plan = build_plan(answers, call, answer_after, already_passed);
            cmd_simulate(SimulateArgs {
                script,
                start,
                plan,
                block_audio,
                limit: Duration::from_millis(limit_ms),
                format: format.into(),
            })
        }
        Commands::Script { path } => cmd_script(path),
        Commands::Routes => cmd_routes(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// ARGUMENT RESOLUTION
// ============================================================================

/// Resolve a route given on the command line.
fn resolve_start(route: &str) -> Result<ScreenId, String> {
    ScreenId::from_route(route).ok_or_else(|| {
        format!(
            "Unknown route '{}'. Run `ringflow routes` for the list.",
            route
        )
    })
}

/// Translate simulate flags into a plan for the simulated user.
fn build_plan(answers: Vec<usize>, call: CallArg, answer_after: u64, already_passed: bool) -> Plan {
    let after = Duration::from_millis(answer_after);
    let response = match call {
        CallArg::Answer => CallResponse::Answer { after },
        CallArg::Decline => CallResponse::Decline { after },
        CallArg::Wait => CallResponse::Wait,
    };

    let mut plan = Plan {
        answers,
        call: VecDeque::from([response]),
        ..Plan::default()
    };
    if already_passed {
        plan.intro.push_back(IntroChoice::AlreadyPassed);
    }
    plan
}

// ============================================================================
// COMMANDS
// ============================================================================

struct RunArgs {
    script: Option<PathBuf>,
    start: String,
    player: Option<String>,
    silent: bool,
    log_file: Option<PathBuf>,
    /// Print the transcript in this format after exit.
    transcript: Option<OutputFormat>,
}

fn cmd_run(args: RunArgs) -> Result<(), String> {
    let start = resolve_start(&args.start)?;

    if let Some(path) = args.log_file.or_else(logging::default_log_path) {
        // A session without a log file is still a session
        if let Err(e) = logging::init_file(&path) {
            eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
        }
    }

    let script = resolve_script(args.script.as_deref()).map_err(|e| e.to_string())?;

    let player: Box<dyn MediaPlayer> = if args.silent {
        Box::new(SilentPlayer)
    } else {
        match args.player {
            Some(line) => Box::new(
                CommandPlayer::from_command_line(&line)
                    .ok_or_else(|| "--player needs a command".to_string())?,
            ),
            None => Box::new(CommandPlayer::default()),
        }
    };

    let transcript = tui::run::run(script, player.as_ref(), start)
        .map_err(|e| format!("Terminal error: {}", e))?;

    if let Some(format) = args.transcript {
        print!("{}", format_transcript(&transcript, format));
    }
    Ok(())
}

struct SimulateArgs {
    script: Option<PathBuf>,
    start: String,
    plan: Plan,
    block_audio: bool,
    limit: Duration,
    format: OutputFormat,
}

fn cmd_simulate(args: SimulateArgs) -> Result<(), String> {
    logging::init_stderr();

    let start = resolve_start(&args.start)?;
    if let Some(&option) = args.plan.answers.iter().find(|&&o| o >= OPTION_COUNT) {
        return Err(format!(
            "Answer {} out of range (options are 0-{})",
            option,
            OPTION_COUNT - 1
        ));
    }

    let script = resolve_script(args.script.as_deref()).map_err(|e| e.to_string())?;

    let mut simulation = Simulation::new(&script, args.plan).limit(args.limit);
    if args.block_audio {
        warn!("all clips blocked");
        simulation = simulation.block_all();
    }
    let transcript = simulation.run_from(start);

    print!("{}", format_transcript(&transcript, args.format));
    Ok(())
}

fn cmd_script(path: Option<PathBuf>) -> Result<(), String> {
    let Some(path) = path else {
        let json = serde_json::to_string_pretty(&default_script())
            .map_err(|e| format!("Failed to serialize script: {}", e))?;
        println!("{}", json);
        return Ok(());
    };

    let script = load_script(&path).map_err(|e| e.to_string())?;

    println!("Script: {}", path.display());
    println!("  Headline:  {}", script.headline);
    println!("  Caller:    {} ({})", script.caller.name, script.caller.label);
    println!("  Questions: {}", script.questions.len());
    for (name, source) in [
        ("ringing", &script.clips.ringing),
        ("in-call", &script.clips.in_call),
        ("end-call", &script.clips.end_call),
    ] {
        println!(
            "  Clip {:<9} {} ({} ms)",
            format!("{}:", name),
            source.location,
            source.length().as_millis()
        );
    }
    println!("OK");
    Ok(())
}

fn cmd_routes() -> Result<(), String> {
    for id in ScreenId::ALL {
        let marker = if id.is_terminal() { "  (terminal)" } else { "" };
        println!("{:<16} {}{}", id.route(), id, marker);
    }
    Ok(())
}

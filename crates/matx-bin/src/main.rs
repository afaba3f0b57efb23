//! matx entrypoint: headless find/replace over a file with full undo history.
use anyhow::{Context, Result, bail};
use clap::Parser;
use core_actions::{Action, DispatchResult, Outcome, default_search_flags, dispatch, session_options};
use core_config::load_from;
use core_events::TracingEventSink;
use core_search::{SearchFlags, SearchQuery, find_all};
use core_state::{EditOp, EditorSession};
use core_text::Selection;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Once};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod io;
mod script;

use script::{ScriptCommand, ScriptOption};

const LOG_FILE: &str = "matx.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "matx", version, about = "Find and replace with undo history")]
struct Args {
    /// UTF-8 text file to edit.
    pub path: PathBuf,
    /// Optional configuration file path (overrides discovery of `matx.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Literal text to search for.
    #[arg(long)]
    pub find: Option<String>,
    /// Replacement for `--find` (literal, no capture expansion).
    #[arg(long, requires = "find")]
    pub replace: Option<String>,
    /// Replace every match instead of the first.
    #[arg(long, requires = "replace")]
    pub all: bool,
    #[arg(long)]
    pub case_sensitive: bool,
    #[arg(long)]
    pub whole_word: bool,
    /// Command script to run against the document.
    #[arg(long, conflicts_with = "find")]
    pub script: Option<PathBuf>,
    /// Write the result here instead of stdout.
    #[arg(long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,
    /// Write the result back to PATH.
    #[arg(long)]
    pub in_place: bool,
    /// Print one status line per command to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<ExitCode> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let code = run(&args)?;
    info!(target: "runtime", "shutdown");
    Ok(code)
}

/// File logging is opt-in via `MATX_LOG` (or `RUST_LOG`).
fn configure_logging() -> Option<WorkerGuard> {
    let filter = match std::env::var("MATX_LOG") {
        Ok(directives) => tracing_subscriber::EnvFilter::new(directives),
        Err(_) if std::env::var_os("RUST_LOG").is_some() => {
            tracing_subscriber::EnvFilter::from_default_env()
        }
        Err(_) => return None,
    };
    let file_appender = tracing_appender::rolling::never(".", LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; drop guard so writer shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = load_from(args.config.clone())?;
    let doc = io::open_document(&args.path)?;
    if doc.mixed_line_endings {
        warn!(
            target: "io",
            file = %args.path.display(),
            line_ending = ?doc.line_ending,
            "mixed_line_endings_normalized"
        );
    }
    info!(
        target: "runtime.startup",
        buffer = doc.buffer.name.as_str(),
        config = ?config.source,
        strategy = ?config.file.history.strategy,
        "bootstrap_complete"
    );

    let mut flags = default_search_flags(&config);
    if args.case_sensitive {
        flags.insert(SearchFlags::CASE_SENSITIVE);
    }
    if args.whole_word {
        flags.insert(SearchFlags::WHOLE_WORD);
    }

    // --find alone: list matches, grep-style exit status.
    if let Some(pattern) = &args.find
        && args.replace.is_none()
    {
        let query = SearchQuery::new(pattern, flags)?;
        let matches = find_all(&doc.buffer, &query);
        let mut stdout = std::io::stdout().lock();
        for m in &matches {
            writeln!(stdout, "{}..{}", m.start, m.end)?;
        }
        return Ok(if matches.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    let commands = plan(args)?;
    let line_ending = doc.line_ending;
    let mut session = EditorSession::new(doc.buffer, session_options(&config))
        .with_sink(Arc::new(TracingEventSink));
    for cmd in commands {
        let label = format!("{cmd:?}");
        let Some(action) = to_action(cmd, &session, &mut flags)? else {
            continue;
        };
        let result = dispatch(action, &mut session, &[]);
        // no echo comes back from a headless front end
        if result.apply.is_some() {
            session.acknowledge_apply();
        }
        check(&result).with_context(|| label.clone())?;
        if args.verbose {
            eprintln!("{label}: {}", describe(&result.outcome));
        }
    }

    let text = session.text();
    let target = if args.in_place {
        Some(args.path.clone())
    } else {
        args.output.clone()
    };
    match target {
        Some(path) => io::write_document(&path, &text, line_ending)?,
        None => {
            let out = io::restore_line_endings(&text, line_ending);
            std::io::stdout().lock().write_all(out.as_bytes())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Commands from `--script`, or the single find/replace given as flags.
fn plan(args: &Args) -> Result<Vec<ScriptCommand>> {
    if let Some(path) = &args.script {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        return script::parse_script(&src);
    }
    let (Some(pattern), Some(replacement)) = (&args.find, &args.replace) else {
        return Ok(Vec::new());
    };
    if args.all {
        return Ok(vec![ScriptCommand::ReplaceAll {
            pattern: pattern.clone(),
            replacement: replacement.clone(),
        }]);
    }
    // first press selects, second replaces
    let replace = ScriptCommand::Replace {
        pattern: pattern.clone(),
        replacement: replacement.clone(),
    };
    Ok(vec![replace.clone(), replace])
}

fn to_action(
    cmd: ScriptCommand,
    session: &EditorSession,
    flags: &mut SearchFlags,
) -> Result<Option<Action>> {
    let action = match cmd {
        ScriptCommand::Find(pattern) => Action::Find {
            pattern,
            flags: *flags,
        },
        ScriptCommand::Replace {
            pattern,
            replacement,
        } => Action::Replace {
            pattern,
            replacement,
            flags: *flags,
        },
        ScriptCommand::ReplaceAll {
            pattern,
            replacement,
        } => Action::ReplaceAll {
            pattern,
            replacement,
            flags: *flags,
        },
        ScriptCommand::Undo => Action::Undo,
        ScriptCommand::Redo => Action::Redo,
        ScriptCommand::Insert { pos, text } => Action::Edit(EditOp::insert(pos, text)),
        ScriptCommand::Delete { start, end } => {
            let removed = session.buffer().slice(start..end)?;
            Action::Edit(EditOp::delete(start, removed))
        }
        ScriptCommand::Select { start, end } => Action::Select(Selection::new(start, end)),
        ScriptCommand::Set { option, on } => {
            let flag = match option {
                ScriptOption::CaseSensitive => SearchFlags::CASE_SENSITIVE,
                ScriptOption::WholeWord => SearchFlags::WHOLE_WORD,
            };
            flags.set(flag, on);
            return Ok(None);
        }
    };
    Ok(Some(action))
}

fn check(result: &DispatchResult) -> Result<()> {
    match &result.outcome {
        Outcome::InvalidPattern => bail!("search pattern is empty"),
        Outcome::Rejected(e) => Err(e.clone().into()),
        _ => Ok(()),
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Edited => "edited".into(),
        Outcome::Selected => "selected".into(),
        Outcome::Restored => "restored".into(),
        Outcome::NothingToDo => "nothing to do".into(),
        Outcome::Found(m) => format!("found {}..{}", m.start, m.end),
        Outcome::NotFound => "not found".into(),
        Outcome::Replaced(n) => format!("replaced {n}"),
        Outcome::InvalidPattern => "invalid pattern".into(),
        Outcome::Rejected(e) => format!("rejected: {e}"),
    }
}

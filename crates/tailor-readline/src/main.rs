mod helper;
mod history_log;
mod interpreter;
mod repl;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use tailor_application::{AutoSaveController, SessionConsole, StdinPrompter};
use tailor_core::history::HistoryReader;
use tailor_core::interpreter::Interpreter;
use tailor_core::session::{SessionEnvironment, SessionRepository};
use tailor_infrastructure::{ConfigService, JsonSessionRepository, TailorPaths};

use crate::helper::CliHelper;
use crate::history_log::HistoryLog;
use crate::interpreter::ScratchInterpreter;
use crate::repl::{Flow, Repl};

/// Interactive shell whose sessions can be saved, replayed and extended.
#[derive(Parser, Debug)]
#[command(name = "tailor", version, about)]
struct Args {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a saved session before the first prompt
    #[arg(short, long)]
    session: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Configuration =====
    let paths = TailorPaths::resolve().context("Failed to resolve Tailor directories")?;
    let config_service = ConfigService::new(args.config.unwrap_or_else(|| paths.config_file()));
    let config = config_service
        .load()
        .with_context(|| format!("Failed to load {}", config_service.path().display()))?;

    let _log_guard = init_logging(&paths.logs_dir(), &config.logging.level)?;
    tracing::info!("[Shell] Starting tailor {}", env!("CARGO_PKG_VERSION"));

    // ===== Composition =====
    let interpreter = ScratchInterpreter::new();
    let project_path = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let environment = SessionEnvironment::new(project_path)
        .with_interpreter_version(interpreter.version())
        .with_runtime_version(Some(format!("tailor {}", env!("CARGO_PKG_VERSION"))));

    let sessions_dir = paths.sessions_dir(&config);
    let repository: Arc<dyn SessionRepository> = Arc::new(
        JsonSessionRepository::new(&sessions_dir, environment)
            .with_context(|| format!("Failed to open {}", sessions_dir.display()))?,
    );
    let history_file = paths.history_file(&config);
    let history = HistoryReader::new(&history_file);

    let console = SessionConsole::new(repository.clone(), history.clone(), Box::new(StdinPrompter));
    let auto_save = AutoSaveController::new(repository, history.clone(), config.auto_save());
    if auto_save.is_enabled() {
        tracing::info!("[Shell] Auto-save enabled: {:?}", config.auto_save());
    }

    let mut repl = Repl::new(
        console,
        auto_save,
        history,
        HistoryLog::new(&history_file),
        interpreter,
    );

    // ===== REPL Setup =====
    let mut editor: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(CliHelper::new()));
    editor.set_max_history_size(config.history.limit)?;
    load_editor_history(&mut editor, &history_file);

    println!("{}", "=== Tailor ===".bright_magenta().bold());
    println!(
        "{}",
        "Type 'help' for commands, 'session:list' for saved sessions, or 'exit' to quit."
            .bright_black()
    );
    println!();

    if let Some(name) = args.session.as_deref() {
        repl.replay(name, &mut io::stdout());
    }

    // ===== Main REPL Loop =====
    loop {
        match editor.readline(">>> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                if repl.handle_line(&line, &mut io::stdout()) == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'exit' to quit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    tracing::info!(
        "[Shell] Exiting with {} captured command(s)",
        repl.tracker().command_count()
    );
    Ok(())
}

/// Seeds the editor's in-memory history (arrow-up recall) from the log.
fn load_editor_history(editor: &mut Editor<CliHelper, DefaultHistory>, history_file: &Path) {
    let Ok(content) = fs::read_to_string(history_file) else {
        return;
    };
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let _ = editor.add_history_entry(line);
    }
}

/// Logs go to a daily file so they never interleave with the prompt.
fn init_logging(logs_dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, "tailor.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{level}'"))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

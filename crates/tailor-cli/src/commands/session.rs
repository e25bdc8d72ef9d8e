use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tailor_application::{SessionCommand, SessionConsole, ShellContext, StdinPrompter};
use tailor_core::history::HistoryReader;
use tailor_core::session::SessionEnvironment;
use tailor_infrastructure::JsonSessionRepository;

use super::Environment;

/// Runs one session command without a live shell.
///
/// `save`, `execute` and `update` need the shell's tracker and interpreter;
/// the console rejects them with exit code 1.
pub fn run(command: SessionCommand, config: Option<PathBuf>) -> Result<u8> {
    let env = Environment::resolve(config)?;
    let loaded = env.load_config()?;

    let project_path = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let environment = SessionEnvironment::new(project_path)
        .with_runtime_version(Some(format!("tailor-sessions {}", env!("CARGO_PKG_VERSION"))));

    let sessions_dir = env.paths.sessions_dir(&loaded);
    let repository = Arc::new(
        JsonSessionRepository::new(&sessions_dir, environment)
            .with_context(|| format!("Failed to open {}", sessions_dir.display()))?,
    );
    let history = HistoryReader::new(env.paths.history_file(&loaded));

    tracing::debug!(
        "[Cli] Running session:{} against {:?}",
        command.action(),
        sessions_dir
    );
    let mut console = SessionConsole::new(repository, history, Box::new(StdinPrompter));
    let code = console.dispatch(command, ShellContext::detached(), &mut io::stdout());
    Ok(u8::try_from(code).unwrap_or(1))
}

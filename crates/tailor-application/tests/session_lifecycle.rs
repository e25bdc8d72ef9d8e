use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tailor_application::console::{EXIT_FAILURE, EXIT_SUCCESS};
use tailor_application::{Prompter, SessionCommand, SessionConsole, ShellContext};
use tailor_core::history::HistoryReader;
use tailor_core::interpreter::{Interpreter, InterpreterError, Value};
use tailor_core::session::{SessionEnvironment, SessionName, SessionRepository, SessionTracker};
use tailor_infrastructure::JsonSessionRepository;
use tempfile::TempDir;

/// Answers confirmations from a queue; an empty queue means "no".
struct ScriptedPrompter {
    answers: VecDeque<bool>,
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, _question: &str) -> bool {
        self.answers.pop_front().unwrap_or(false)
    }
}

/// Echoes integer literals back and fails on anything mentioning "boom".
#[derive(Default)]
struct EchoInterpreter {
    seen: Vec<String>,
}

impl Interpreter for EchoInterpreter {
    fn execute(&mut self, code: &str) -> Result<Value, InterpreterError> {
        self.seen.push(code.to_string());
        if code.contains("boom") {
            return Err(InterpreterError::new("Call to undefined function boom()"));
        }
        Ok(code.parse::<i64>().map(Value::Int).unwrap_or(Value::Null))
    }
}

struct Shell {
    _temp_dir: TempDir,
    history_path: PathBuf,
    sessions_dir: PathBuf,
    repository: Arc<JsonSessionRepository>,
}

impl Shell {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history");
        let sessions_dir = temp_dir.path().join("sessions");
        fs::write(&history_path, "_HiStOrY_V2_\n").unwrap();
        let repository = Arc::new(
            JsonSessionRepository::new(&sessions_dir, SessionEnvironment::new("/srv/app")).unwrap(),
        );
        Self {
            _temp_dir: temp_dir,
            history_path,
            sessions_dir,
            repository,
        }
    }

    fn history(&self) -> HistoryReader {
        HistoryReader::new(&self.history_path)
    }

    fn console(&self, answers: &[bool]) -> SessionConsole {
        SessionConsole::new(
            self.repository.clone(),
            self.history(),
            Box::new(ScriptedPrompter {
                answers: answers.iter().copied().collect(),
            }),
        )
    }

    /// A fresh shell process: tracker watermark at the current end of the log.
    fn start(&self) -> SessionTracker {
        let mut tracker = SessionTracker::new();
        self.history().mark_start(&mut tracker);
        tracker
    }

    fn type_lines(&self, lines: &[&str]) {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.history_path)
            .unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    fn session_file(&self, name: &str) -> PathBuf {
        self.sessions_dir.join(format!("{name}.json"))
    }
}

fn run<'a>(
    console: &mut SessionConsole,
    command: SessionCommand,
    tracker: Option<&'a mut SessionTracker>,
    interpreter: Option<&'a mut dyn Interpreter>,
) -> (i32, String) {
    let mut out = Vec::new();
    let ctx = ShellContext {
        tracker,
        interpreter,
    };
    let code = console.dispatch(command, ctx, &mut out);
    (code, String::from_utf8(out).unwrap())
}

fn save(name: &str) -> SessionCommand {
    SessionCommand::Save {
        name: Some(name.to_string()),
        force: false,
        description: None,
        tags: vec![],
    }
}

fn name(value: &str) -> SessionName {
    SessionName::new(value).unwrap()
}

#[test]
fn test_save_list_view_delete() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    let mut console = shell.console(&[]);
    shell.type_lines(&["$a = 1", "help", "$b = $a + 1", "session:list"]);

    let (code, text) = run(
        &mut console,
        SessionCommand::Save {
            name: Some("demo".to_string()),
            force: false,
            description: Some("First run".to_string()),
            tags: vec!["api".to_string(), "debug".to_string()],
        },
        Some(&mut tracker),
        None,
    );
    assert_eq!(code, EXIT_SUCCESS, "{text}");
    assert!(text.contains("Session saved successfully!"));

    let stored = shell.repository.load(&name("demo")).unwrap();
    let codes: Vec<&str> = stored.commands.iter().map(|c| c.code.as_str()).collect();
    let orders: Vec<u32> = stored.commands.iter().map(|c| c.order).collect();
    assert_eq!(codes, vec!["$a = 1", "$b = $a + 1"]);
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(stored.stats.project_path, "/srv/app");

    let (code, text) = run(
        &mut console,
        SessionCommand::List { tags: vec!["api".to_string()] },
        None,
        None,
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("demo"));
    assert!(text.contains("(2 commands)"));

    let (code, text) = run(
        &mut console,
        SessionCommand::View { name: "demo".to_string() },
        None,
        None,
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("$b = $a + 1"));
    assert!(text.contains("First run"));

    let (code, text) = run(
        &mut console,
        SessionCommand::Delete {
            name: "demo".to_string(),
            force: true,
        },
        None,
        None,
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("Session 'demo' deleted successfully!"));
    assert!(!shell.session_file("demo").exists());

    let (_, text) = run(&mut console, SessionCommand::List { tags: vec![] }, None, None);
    assert!(text.contains("No saved sessions found."));
}

#[test]
fn test_save_without_commands_fails() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    let mut console = shell.console(&[]);
    shell.type_lines(&["history", "session:save"]);

    let (code, text) = run(&mut console, save("empty"), Some(&mut tracker), None);
    assert_eq!(code, EXIT_FAILURE);
    assert!(text.contains("No commands to save. Execute some commands first."));
    assert!(!shell.session_file("empty").exists());
}

#[test]
fn test_overwrite_declined_keeps_existing_session() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["$a = 1"]);
    let mut console = shell.console(&[false]);

    assert_eq!(run(&mut console, save("demo"), Some(&mut tracker), None).0, EXIT_SUCCESS);
    let before = fs::read(shell.session_file("demo")).unwrap();

    shell.type_lines(&["$b = 2"]);
    let (code, text) = run(&mut console, save("demo"), Some(&mut tracker), None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("Session 'demo' already exists."));
    assert!(text.contains("Save cancelled."));
    assert_eq!(fs::read(shell.session_file("demo")).unwrap(), before);
}

#[test]
fn test_save_generates_name_when_omitted() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["$a = 1"]);
    let mut console = shell.console(&[]);

    let command = SessionCommand::Save {
        name: None,
        force: false,
        description: None,
        tags: vec![],
    };
    let (code, text) = run(&mut console, command, Some(&mut tracker), None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("Auto-generated session name: session-"));
    assert_eq!(shell.repository.list(&[]).unwrap().len(), 1);
}

#[test]
fn test_invalid_name_never_touches_the_filesystem() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["$a = 1"]);
    let mut console = shell.console(&[]);

    for bad in ["../escape", "a/b", "name.json"] {
        let (code, _) = run(&mut console, save(bad), Some(&mut tracker), None);
        assert_eq!(code, EXIT_FAILURE, "{bad} should be rejected");
    }
    assert!(fs::read_dir(&shell.sessions_dir).unwrap().next().is_none());
    assert!(!shell.sessions_dir.parent().unwrap().join("escape.json").exists());
}

#[test]
fn test_replay_then_update_appends_with_continuing_order() {
    let shell = Shell::new();

    // First process: three commands, saved.
    let mut first = shell.start();
    shell.type_lines(&["1", "2", "3", "session:save work"]);
    let mut console = shell.console(&[]);
    assert_eq!(run(&mut console, save("work"), Some(&mut first), None).0, EXIT_SUCCESS);
    let created_at = shell.repository.load(&name("work")).unwrap().metadata.created_at;

    // Second process: replay, type more, update.
    let mut tracker = shell.start();
    let mut interpreter = EchoInterpreter::default();
    shell.type_lines(&["session:execute work"]);
    let (code, text) = run(
        &mut console,
        SessionCommand::Execute { name: "work".to_string() },
        Some(&mut tracker),
        Some(&mut interpreter),
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(interpreter.seen, vec!["1", "2", "3"]);
    assert!(text.contains("Executed 3 command(s)"));
    assert_eq!(tracker.loaded_session_name(), Some(&name("work")));

    shell.type_lines(&["4", "5", "session:update"]);
    let command = SessionCommand::Update {
        description: None,
        tags: vec![],
    };
    let (code, text) = run(&mut console, command.clone(), Some(&mut tracker), None);
    assert_eq!(code, EXIT_SUCCESS, "{text}");
    assert!(text.contains("Added 2 new command(s)"));
    assert!(text.contains("Total commands: 5"));

    let stored = shell.repository.load(&name("work")).unwrap();
    let orders: Vec<u32> = stored.commands.iter().map(|c| c.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    assert_eq!(stored.stats.total_commands, 5);
    assert_eq!(stored.metadata.created_at, created_at);

    // Nothing typed since: no write at all.
    let before = fs::read(shell.session_file("work")).unwrap();
    let (code, text) = run(&mut console, command, Some(&mut tracker), None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("No new commands to add to the session."));
    assert_eq!(fs::read(shell.session_file("work")).unwrap(), before);
}

#[test]
fn test_update_applies_overrides() {
    let shell = Shell::new();
    let mut first = shell.start();
    shell.type_lines(&["1"]);
    let mut console = shell.console(&[]);
    run(&mut console, save("work"), Some(&mut first), None);

    let mut tracker = shell.start();
    let mut interpreter = EchoInterpreter::default();
    run(
        &mut console,
        SessionCommand::Execute { name: "work".to_string() },
        Some(&mut tracker),
        Some(&mut interpreter),
    );
    shell.type_lines(&["2"]);

    let command = SessionCommand::Update {
        description: Some("Now with more".to_string()),
        tags: vec!["v2".to_string()],
    };
    assert_eq!(run(&mut console, command, Some(&mut tracker), None).0, EXIT_SUCCESS);

    let stored = shell.repository.load(&name("work")).unwrap();
    assert_eq!(
        stored.metadata.description.as_ref().map(|d| d.as_str()),
        Some("Now with more")
    );
    assert_eq!(stored.metadata.tags.to_strings(), vec!["v2"]);
}

#[test]
fn test_update_without_loaded_session() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["$a = 1", "update"]);
    let mut console = shell.console(&[]);

    let command = SessionCommand::Update {
        description: None,
        tags: vec![],
    };
    let (code, text) = run(&mut console, command, Some(&mut tracker), None);
    assert_eq!(code, EXIT_FAILURE);
    assert!(text.contains("No session is currently loaded."));
    assert!(text.contains("tailor --session"));

    // The failed `update` line is not part of what gets saved.
    assert_eq!(run(&mut console, save("after"), Some(&mut tracker), None).0, EXIT_SUCCESS);
    let stored = shell.repository.load(&name("after")).unwrap();
    let codes: Vec<&str> = stored.commands.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["$a = 1"]);
}

#[test]
fn test_replay_survives_failing_commands() {
    let shell = Shell::new();
    let mut first = shell.start();
    shell.type_lines(&["1", "boom()", "3"]);
    let mut console = shell.console(&[]);
    run(&mut console, save("flaky"), Some(&mut first), None);

    let mut tracker = shell.start();
    let mut interpreter = EchoInterpreter::default();
    let (code, text) = run(
        &mut console,
        SessionCommand::Execute { name: "flaky".to_string() },
        Some(&mut tracker),
        Some(&mut interpreter),
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(interpreter.seen.len(), 3);
    assert!(text.contains("Failed to execute: Call to undefined function boom()"));
    assert!(text.contains("Executed 2 command(s) (1 failed)"));
}

#[test]
fn test_list_orders_by_last_update() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["1"]);
    let mut console = shell.console(&[]);

    for (session, day) in [("older", 1), ("newest", 3), ("middle", 2)] {
        run(&mut console, save(session), Some(&mut tracker), None);
        let mut data = shell.repository.load(&name(session)).unwrap();
        data.metadata.updated_at = Some(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap());
        shell.repository.update(&data).unwrap();
    }

    let names: Vec<String> = shell
        .repository
        .list(&[])
        .unwrap()
        .into_iter()
        .map(|s| s.name.to_string())
        .collect();
    assert_eq!(names, vec!["newest", "middle", "older"]);
}

#[test]
fn test_edit_and_delete_confirmation() {
    let shell = Shell::new();
    let mut tracker = shell.start();
    shell.type_lines(&["1"]);
    let mut console = shell.console(&[false]);
    run(
        &mut console,
        SessionCommand::Save {
            name: Some("demo".to_string()),
            force: false,
            description: None,
            tags: vec!["api".to_string()],
        },
        Some(&mut tracker),
        None,
    );

    let edit = |add: &[&str], remove: &[&str]| SessionCommand::Edit {
        name: "demo".to_string(),
        description: None,
        add_tags: add.iter().map(|t| t.to_string()).collect(),
        remove_tags: remove.iter().map(|t| t.to_string()).collect(),
        set_tags: vec![],
    };

    let (code, text) = run(&mut console, edit(&[], &[]), None, None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("No changes specified."));

    let (code, text) = run(&mut console, edit(&["bug"], &["api"]), None, None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("Session updated successfully!"));
    let stored = shell.repository.load(&name("demo")).unwrap();
    assert_eq!(stored.metadata.tags.to_strings(), vec!["bug"]);

    // The scripted prompter declines the deletion.
    let (code, text) = run(
        &mut console,
        SessionCommand::Delete {
            name: "demo".to_string(),
            force: false,
        },
        None,
        None,
    );
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("Delete cancelled."));
    assert!(shell.session_file("demo").exists());
}

#[test]
fn test_missing_session_and_detached_shell_exit_codes() {
    let shell = Shell::new();
    let mut console = shell.console(&[]);

    let (code, text) = run(
        &mut console,
        SessionCommand::View { name: "nope".to_string() },
        None,
        None,
    );
    assert_eq!(code, EXIT_FAILURE);
    assert!(text.contains("Session 'nope' does not exist."));

    let (code, _) = run(
        &mut console,
        SessionCommand::Delete {
            name: "nope".to_string(),
            force: true,
        },
        None,
        None,
    );
    assert_eq!(code, EXIT_FAILURE);

    for command in [
        save("demo"),
        SessionCommand::Execute { name: "demo".to_string() },
        SessionCommand::Update {
            description: None,
            tags: vec![],
        },
    ] {
        let (code, text) = run(&mut console, command, None, None);
        assert_eq!(code, EXIT_FAILURE);
        assert!(text.contains("needs a live shell"), "{text}");
    }
}

#[test]
fn test_corrupt_file_is_reported_and_skipped_by_list() {
    let shell = Shell::new();
    fs::write(shell.session_file("broken"), "{ not json").unwrap();
    let mut console = shell.console(&[]);

    let (code, text) = run(
        &mut console,
        SessionCommand::View { name: "broken".to_string() },
        None,
        None,
    );
    assert_eq!(code, EXIT_FAILURE);
    assert!(text.contains("Failed to view session"));

    let (code, text) = run(&mut console, SessionCommand::List { tags: vec![] }, None, None);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(text.contains("No saved sessions found."));
}

//! Decides which history lines are internal and must not be captured.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading-token patterns for commands that never belong to a session.
const SKIP_PATTERNS: [&str; 7] = [
    r"^session:\S*",
    r"^update(\s|$)",
    r"^help(\s|$)",
    r"^exit(\s|$)",
    r"^quit(\s|$)",
    r"^history(\s|$)",
    r"^clear(\s|$)",
];

static SKIP_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    SKIP_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("skip pattern is valid"))
        .collect()
});

static UPDATE_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(session:)?update(\s|$)").expect("update pattern is valid"));

/// Stateless filter over raw history lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandFilter;

impl CommandFilter {
    pub fn new() -> Self {
        Self
    }

    /// True for blank lines, session-management commands (the bare `update`
    /// alias included) and the shell's own `help`, `exit`, `quit`, `history`
    /// and `clear`.
    pub fn should_skip(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        SKIP_REGEXES.iter().any(|re| re.is_match(line))
    }

    /// Keeps only the lines [`Self::should_skip`] rejects.
    pub fn filter_commands<I, S>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| !self.should_skip(line.as_ref()))
            .map(|line| line.as_ref().to_string())
            .collect()
    }

    /// True when the line is the `update` command (with or without the `session:` prefix).
    pub fn is_update_command(&self, line: &str) -> bool {
        UPDATE_COMMAND.is_match(line.trim())
    }

    pub fn skip_patterns(&self) -> &'static [&'static str] {
        &SKIP_PATTERNS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_internal_commands() {
        let filter = CommandFilter::new();
        assert!(filter.should_skip("session:save foo"));
        assert!(filter.should_skip("session:list"));
        assert!(filter.should_skip("help"));
        assert!(filter.should_skip("  exit  "));
        assert!(filter.should_skip("quit"));
        assert!(filter.should_skip("history --show"));
        assert!(filter.should_skip("clear"));
    }

    #[test]
    fn test_skips_bare_update_alias() {
        let filter = CommandFilter::new();
        assert!(filter.should_skip("update"));
        assert!(filter.should_skip("update -d 'more'"));
        assert!(!filter.should_skip("update($row)"));
        assert!(!filter.should_skip("$update = 1"));
        assert_eq!(
            filter.filter_commands(["$a = 1", "update", "$b = 2"]),
            vec!["$a = 1", "$b = 2"]
        );
    }

    #[test]
    fn test_skips_blank_lines() {
        let filter = CommandFilter::new();
        assert!(filter.should_skip(""));
        assert!(filter.should_skip("   "));
        assert!(filter.should_skip("\t"));
    }

    #[test]
    fn test_matches_whole_leading_token_only() {
        let filter = CommandFilter::new();
        assert!(!filter.should_skip("echo 1"));
        assert!(!filter.should_skip("$help = 1"));
        assert!(!filter.should_skip("helper()"));
        assert!(!filter.should_skip("exits(1)"));
        assert!(!filter.should_skip("$x = 'session:save'"));
    }

    #[test]
    fn test_filter_commands_preserves_order() {
        let filter = CommandFilter::new();
        let kept = filter.filter_commands(["$a = 1", "help", "", "$b = 2", "session:list"]);
        assert_eq!(kept, vec!["$a = 1", "$b = 2"]);
    }

    #[test]
    fn test_update_command_detection() {
        let filter = CommandFilter::new();
        assert!(filter.is_update_command("update"));
        assert!(filter.is_update_command("update -d 'x'"));
        assert!(filter.is_update_command("session:update"));
        assert!(!filter.is_update_command("$updated = 1"));
        assert!(!filter.is_update_command("updates()"));
    }
}

//! Line commands read from stdin and the text rendering of snapshots.

use std::fmt::Write as _;

use shared::{
    domain::StoryId,
    protocol::{ControllerSnapshot, LoadPhase},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Search(String),
    Remove(StoryId),
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "commands: search <term> | remove <id> | show | help | quit";

pub fn parse_command(line: &str) -> Result<HostCommand, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "search" | "s" => Ok(HostCommand::Search(rest.to_string())),
        "remove" | "dismiss" | "rm" => rest
            .parse::<i64>()
            .map(|id| HostCommand::Remove(StoryId(id)))
            .map_err(|_| format!("remove expects a numeric story id, got '{rest}'")),
        "show" | "" => Ok(HostCommand::Show),
        "help" | "?" => Ok(HostCommand::Help),
        "quit" | "exit" | "q" => Ok(HostCommand::Quit),
        other => Err(format!("unknown command '{other}'; {HELP}")),
    }
}

pub fn render(snapshot: &ControllerSnapshot) -> String {
    let mut out = format!("Search: {}\n", snapshot.search_term);
    match snapshot.phase {
        LoadPhase::Idle | LoadPhase::Loading => out.push_str("Loading ...\n"),
        LoadPhase::Error => out.push_str("Something went wrong ...\n"),
        LoadPhase::Success if snapshot.visible.is_empty() => out.push_str("(no matches)\n"),
        LoadPhase::Success => {
            for story in &snapshot.visible {
                let _ = writeln!(
                    out,
                    "[{}] {} <{}> by {} | {} comments | {} points",
                    story.id, story.title, story.url, story.author, story.comment_count, story.score
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::initial_stories;

    #[test]
    fn parses_search_with_spaces() {
        assert_eq!(
            parse_command("search  react hooks "),
            Ok(HostCommand::Search("react hooks".into()))
        );
        assert_eq!(parse_command("search"), Ok(HostCommand::Search(String::new())));
    }

    #[test]
    fn parses_remove_and_rejects_bad_ids() {
        assert_eq!(parse_command("remove 1"), Ok(HostCommand::Remove(StoryId(1))));
        assert!(parse_command("remove one").is_err());
    }

    #[test]
    fn parses_simple_verbs() {
        assert_eq!(parse_command(""), Ok(HostCommand::Show));
        assert_eq!(parse_command("QUIT"), Ok(HostCommand::Quit));
        assert_eq!(parse_command("?"), Ok(HostCommand::Help));
        assert!(parse_command("reload").is_err());
    }

    #[test]
    fn renders_each_phase() {
        let mut snapshot = ControllerSnapshot {
            search_term: "React".into(),
            visible: Vec::new(),
            phase: LoadPhase::Loading,
        };
        assert!(render(&snapshot).contains("Loading ..."));

        snapshot.phase = LoadPhase::Error;
        assert!(render(&snapshot).contains("Something went wrong"));

        snapshot.phase = LoadPhase::Success;
        assert!(render(&snapshot).contains("(no matches)"));

        snapshot.visible = initial_stories();
        let text = render(&snapshot);
        assert!(text.contains("[0] React <https://reactjs.org/> by Jordan Walke"));
        assert!(text.contains("[1] Redux"));
    }
}

use std::path::PathBuf;

/// One line typed into the interactive queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Empty,
    Submit(String),
    SetPlatform(String),
    SetFormat(String),
    SetOutDir(PathBuf),
    Clear,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
:platform <auto|youtube|soundcloud|spotify|yandex>
:format <mp3-320|mp3-128|flac|m4a|opus|wav|original>
:out <dir>
:clear   remove finished cards
:quit";

pub fn parse_input(line: &str) -> InputCommand {
    let line = line.trim();
    if line.is_empty() {
        return InputCommand::Empty;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return InputCommand::Submit(line.to_string());
    };

    let (cmd, arg) = match rest.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (rest, ""),
    };
    match (cmd, arg) {
        ("q" | "quit", _) => InputCommand::Quit,
        ("clear", _) => InputCommand::Clear,
        ("h" | "help", _) => InputCommand::Help,
        ("p" | "platform", a) if !a.is_empty() => InputCommand::SetPlatform(a.to_string()),
        ("f" | "format", a) if !a.is_empty() => InputCommand::SetFormat(a.to_string()),
        ("o" | "out", a) if !a.is_empty() => InputCommand::SetOutDir(PathBuf::from(a)),
        _ => InputCommand::Unknown(line.to_string()),
    }
}

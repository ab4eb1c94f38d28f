//! Line commands accepted by the terminal driver

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `set <path> [value...]`; a missing value clears the field
    Set { path: String, value: String },
    /// `parts roof,rear`; no argument unchecks everything
    Parts(Vec<String>),
    Focus(String),
    Blur(String),
    /// `check <path>`: validate a sub-tree on demand
    Check(String),
    Add,
    Remove(usize),
    Show,
    Options,
    Submit,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    #[error("`{0}` needs a field path")]
    MissingPath(&'static str),
    #[error("`remove` needs a witness index, got {0:?}")]
    BadIndex(String),
}

pub const HELP: &str = "\
set <path> [value]   write a field (blank clears), e.g. set witnesses.0.email a@b.cz
parts [p1,p2,...]    damaged parts: roof, front, side, rear
focus <path>         focus a field
blur <path>          leave a field and validate it
check <path>         validate a field or sub-tree now
add                  append an empty witness
remove <index>       remove a witness
show                 print the form
options              list categories
submit               validate everything and submit
reset                restore initial values
quit                 exit";

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let path = |name: &'static str| {
            rest.split_whitespace()
                .next()
                .map(str::to_string)
                .ok_or(CommandError::MissingPath(name))
        };

        let command = match word {
            "" => return Ok(None),
            "set" => {
                let (path, value) = match rest.split_once(char::is_whitespace) {
                    Some((path, value)) => (path, value.trim()),
                    None => (rest, ""),
                };
                if path.is_empty() {
                    return Err(CommandError::MissingPath("set"));
                }
                Command::Set {
                    path: path.to_string(),
                    value: value.to_string(),
                }
            }
            "parts" => Command::Parts(
                rest.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "focus" => Command::Focus(path("focus")?),
            "blur" => Command::Blur(path("blur")?),
            "check" => Command::Check(path("check")?),
            "add" => Command::Add,
            "remove" => Command::Remove(
                rest.parse()
                    .map_err(|_| CommandError::BadIndex(rest.to_string()))?,
            ),
            "show" => Command::Show,
            "options" => Command::Options,
            "submit" => Command::Submit,
            "reset" => Command::Reset,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

//! Line based commands typed into the host

use tanks_core::TankError;
use tanks_events::{NetMessage, Position, TankCommand};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Key code pressed
    Down(u32),
    /// Key code released
    Up(u32),
    /// Published on the session command bus
    Session(TankCommand),
    /// Inbound data from the network peer
    Net(NetMessage),
    Network(bool),
    Status,
    Quit,
}

/// Parse one console line
///
/// Lines starting with `{` are read as a JSON [`TankCommand`], anything else as
/// whitespace separated words. Empty lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, TankError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map(|command| Some(ConsoleCommand::Session(command)))
            .map_err(|e| TankError::InvalidArgument(format!("malformed command: {}", e)));
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        ["down", code] => ConsoleCommand::Down(number(code)?),
        ["up", code] => ConsoleCommand::Up(number(code)?),
        ["enable"] => ConsoleCommand::Session(TankCommand::Enable),
        ["destroy", id] => ConsoleCommand::Session(TankCommand::Destroy { id: id.to_string() }),
        ["pos", left, top] => {
            ConsoleCommand::Session(TankCommand::SetPosition(Position::new(number(left)?, number(top)?)))
        }
        ["net", "init", id] => ConsoleCommand::Net(NetMessage::Init { id: id.to_string() }),
        ["net", "on"] => ConsoleCommand::Network(true),
        ["net", "off"] => ConsoleCommand::Network(false),
        ["status"] => ConsoleCommand::Status,
        ["quit" | "exit"] => ConsoleCommand::Quit,
        _ => return Err(TankError::InvalidArgument(format!("unknown command {:?}", line))),
    };

    Ok(Some(command))
}

fn number<T: std::str::FromStr>(word: &str) -> Result<T, TankError> {
    word.parse()
        .map_err(|_| TankError::InvalidArgument(format!("{:?} is not a number", word)))
}

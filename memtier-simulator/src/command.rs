//! Command lines understood by a simulated process.
//!
//! Grammar: `<Verb> <id> [<value>]` separated by whitespace, where the verb
//! is `Store`, `Release` or `Lookup` and only `Store` takes a value.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Store { id: String, value: u32 },
    Release { id: String },
    Lookup { id: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown verb {0:?}")]
    UnknownVerb(String),
    #[error("{verb} needs a variable name")]
    MissingVariable { verb: &'static str },
    #[error("Store of {id} needs a value")]
    MissingValue { id: String },
    #[error("value {0:?} is not an unsigned 32-bit integer")]
    InvalidValue(String),
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let verb = tokens.next().ok_or(CommandParseError::Empty)?;

        let verb: &'static str = match verb {
            "Store" => "Store",
            "Release" => "Release",
            "Lookup" => "Lookup",
            other => return Err(CommandParseError::UnknownVerb(other.to_owned())),
        };
        let id = tokens
            .next()
            .ok_or(CommandParseError::MissingVariable { verb })?
            .to_owned();

        let command = match verb {
            "Store" => {
                let raw = tokens
                    .next()
                    .ok_or_else(|| CommandParseError::MissingValue { id: id.clone() })?;
                let value = raw
                    .parse::<u32>()
                    .map_err(|_| CommandParseError::InvalidValue(raw.to_owned()))?;
                Command::Store { id, value }
            }
            "Release" => Command::Release { id },
            _ => Command::Lookup { id },
        };

        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            return Err(CommandParseError::TrailingInput(rest.join(" ")));
        }
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Store { id, value } => write!(f, "Store {id} {value}"),
            Command::Release { id } => write!(f, "Release {id}"),
            Command::Lookup { id } => write!(f, "Lookup {id}"),
        }
    }
}

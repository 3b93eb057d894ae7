//! Parsing of the slash commands accepted at the prompt.

use crate::toolkit::Tool;
use iete_core::AspectRatio;
use std::path::PathBuf;
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  /search on|off          toggle web-search grounding
  /attach <path>          attach an image, audio clip or PDF to the next message
  /detach                 drop the pending attachment
  /tool <name>|off        prefix the next message (explain, summarize, quiz, code, translate)
  /image [ratio] <prompt> generate an image (ratio: 1:1, 3:4, 4:3, 9:16, 16:9)
  /name <name>            switch user; clears the conversation
  /reset                  clear the conversation
  /help                   show this help
  /quit                   exit
Anything else is sent as a message; an empty line sends a pending
attachment on its own.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Message(String),
    Search(bool),
    Attach(PathBuf),
    Detach,
    Tool(Option<Tool>),
    Image {
        aspect_ratio: AspectRatio,
        prompt: String,
    },
    Name(String),
    Reset,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `/{0}`; type /help for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Message(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "search" => match arg {
            "on" => Ok(Command::Search(true)),
            "off" => Ok(Command::Search(false)),
            _ => Err(CommandError::Usage("/search on|off")),
        },
        "attach" if !arg.is_empty() => Ok(Command::Attach(PathBuf::from(arg))),
        "attach" => Err(CommandError::Usage("/attach <path>")),
        "detach" => Ok(Command::Detach),
        "tool" => match arg {
            "" => Err(CommandError::Usage("/tool <name>|off")),
            "off" => Ok(Command::Tool(None)),
            name => name
                .parse::<Tool>()
                .map(|tool| Command::Tool(Some(tool)))
                .map_err(CommandError::Invalid),
        },
        "image" => parse_image(arg),
        "name" if !arg.is_empty() => Ok(Command::Name(arg.to_string())),
        "name" => Err(CommandError::Usage("/name <name>")),
        "reset" => Ok(Command::Reset),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_image(arg: &str) -> Result<Command, CommandError> {
    let (first, rest) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
    let (aspect_ratio, prompt) = match first.parse::<AspectRatio>() {
        Ok(ratio) => (ratio, rest.trim()),
        Err(_) => (AspectRatio::default(), arg),
    };
    if prompt.is_empty() {
        return Err(CommandError::Usage("/image [ratio] <prompt>"));
    }
    Ok(Command::Image {
        aspect_ratio,
        prompt: prompt.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse("  what is a MOSFET? "),
            Ok(Command::Message("what is a MOSFET?".to_string()))
        );
        assert_eq!(parse("   "), Ok(Command::Empty));
    }

    #[test]
    fn parses_toggles_and_arguments() {
        assert_eq!(parse("/search on"), Ok(Command::Search(true)));
        assert_eq!(parse("/search off"), Ok(Command::Search(false)));
        assert_eq!(
            parse("/attach ./slides/page 1.png"),
            Ok(Command::Attach(PathBuf::from("./slides/page 1.png")))
        );
        assert_eq!(parse("/tool quiz"), Ok(Command::Tool(Some(Tool::Quiz))));
        assert_eq!(parse("/tool off"), Ok(Command::Tool(None)));
        assert_eq!(parse("/name Ravi Kumar"), Ok(Command::Name("Ravi Kumar".to_string())));
    }

    #[test]
    fn image_ratio_is_optional() {
        assert_eq!(
            parse("/image 16:9 a satellite dish at night"),
            Ok(Command::Image {
                aspect_ratio: AspectRatio::Wide,
                prompt: "a satellite dish at night".to_string(),
            })
        );
        assert_eq!(
            parse("/image a satellite dish"),
            Ok(Command::Image {
                aspect_ratio: AspectRatio::Square,
                prompt: "a satellite dish".to_string(),
            })
        );
        assert_matches!(parse("/image 4:3"), Err(CommandError::Usage(_)));
    }

    #[test]
    fn reports_bad_commands() {
        assert_matches!(parse("/search maybe"), Err(CommandError::Usage(_)));
        assert_matches!(parse("/tool poem"), Err(CommandError::Invalid(_)));
        assert_eq!(parse("/fly"), Err(CommandError::Unknown("fly".to_string())));
    }
}

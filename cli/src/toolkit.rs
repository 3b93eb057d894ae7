//! Toolkit shortcuts: each tool prefixes the next message with a canned
//! instruction.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Explain,
    Summarize,
    Quiz,
    Code,
    Translate,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Explain,
        Tool::Summarize,
        Tool::Quiz,
        Tool::Code,
        Tool::Translate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Explain => "explain",
            Tool::Summarize => "summarize",
            Tool::Quiz => "quiz",
            Tool::Code => "code",
            Tool::Translate => "translate",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Tool::Explain => "Explain the following concept step by step, as if to an engineering student:",
            Tool::Summarize => "Summarize the following in a few concise bullet points:",
            Tool::Quiz => "Create a short multiple-choice quiz (with answers at the end) on:",
            Tool::Code => "Write well-commented code for the following task and explain how it works:",
            Tool::Translate => "Translate the following into English, keeping technical terms accurate:",
        }
    }

    /// Message as sent to the model. With no message of its own the prefix
    /// applies to the attachment alone.
    pub fn apply(self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return self.prefix().to_string();
        }
        format!("{}\n\n{message}", self.prefix())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Tool::ALL.iter().map(|t| t.name()).collect();
                format!("unknown tool `{s}`; choose one of: {}", names.join(", "))
            })
    }
}

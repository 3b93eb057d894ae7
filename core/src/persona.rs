/// Branded identity the model is instructed to adopt, addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    display_name: String,
}

const FALLBACK_NAME: &str = "the user";

impl Persona {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into().trim().to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn system_instruction(&self) -> String {
        let name = if self.display_name.is_empty() {
            FALLBACK_NAME
        } else {
            &self.display_name
        };
        format!(
            "You are IETE Bot, the friendly study and engineering assistant of the \
Institution of Electronics and Telecommunication Engineers. You are talking to {name}; \
address them by name when it feels natural.\n\
Answer clearly and accurately. Format answers in Markdown, use LaTeX between $...$ \
or $$...$$ for mathematics, and use fenced code blocks for code.\n\
When the user shares an image or audio clip, describe or transcribe what is relevant \
before answering. If you are unsure, say so instead of guessing."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_mentions_name() {
        let persona = Persona::new("  Asha ");
        assert_eq!(persona.display_name(), "Asha");
        assert!(persona.system_instruction().contains("talking to Asha;"));
        assert!(persona.system_instruction().starts_with("You are IETE Bot"));
    }

    #[test]
    fn blank_name_uses_fallback() {
        let persona = Persona::new("   ");
        assert!(persona.system_instruction().contains("talking to the user;"));
    }
}

//! Terminal front end for IETE Bot.

pub mod attachment;
pub mod command;
pub mod toolkit;

use crate::command::Command;
use crate::toolkit::Tool;
use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use iete_core::AspectRatio;
use iete_core::Config;
use iete_core::ConfigOverrides;
use iete_core::Conversation;
use iete_core::Media;
use iete_core::Persona;
use iete_core::ReqwestTransport;
use iete_core::StreamResult;
use iete_core::UserInput;
use iete_core::config::find_iete_home;
use iete_core::error::API_KEY_ENV_VAR;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "iete", version, about = "Chat with IETE Bot from the terminal")]
pub struct Cli {
    /// Name IETE Bot should address you by.
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Ground answers with web search from the start.
    #[arg(long)]
    pub search: bool,

    /// Model to chat with, overriding config.toml.
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Directory holding config.toml (defaults to $IETE_HOME or ~/.iete).
    #[arg(long = "config", value_name = "DIR")]
    pub config_home: Option<PathBuf>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let iete_home = match cli.config_home {
        Some(dir) => dir,
        None => find_iete_home()?,
    };
    let overrides = ConfigOverrides {
        model: cli.model,
        api_key: std::env::var(API_KEY_ENV_VAR).ok(),
    };
    let config = Config::load(&iete_home, overrides)
        .with_context(|| format!("loading configuration from {}", iete_home.display()))?;
    debug!(?config, "loaded configuration");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let name = match cli.name {
        Some(name) => name,
        None => {
            prompt("What should I call you? ")?;
            lines.next_line().await?.unwrap_or_default()
        }
    };

    let conversation = Conversation::new(&config, ReqwestTransport::default(), Persona::new(name));
    let mut repl = Repl {
        conversation,
        draft: Draft {
            search: cli.search,
            ..Default::default()
        },
        images_saved: 0,
    };
    repl.greet();

    loop {
        prompt("> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(cmd) => repl.handle(cmd).await?,
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn prompt(text: &str) -> std::io::Result<()> {
    let mut out = std::io::stdout();
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Settings and pending extras that shape the next message.
#[derive(Debug, Default)]
struct Draft {
    search: bool,
    tool: Option<Tool>,
    attachment: Option<Media>,
}

impl Draft {
    /// Builds the input for `text`, consuming the pending tool and attachment.
    /// A blank line only produces input when an attachment is waiting.
    fn take_input(&mut self, text: &str) -> Option<UserInput> {
        if text.trim().is_empty() && self.attachment.is_none() {
            return None;
        }
        let message = match self.tool.take() {
            Some(tool) => tool.apply(text),
            None => text.to_string(),
        };
        Some(UserInput {
            message,
            media: self.attachment.take(),
            use_search: self.search,
        })
    }
}

struct Repl {
    conversation: Conversation<ReqwestTransport>,
    draft: Draft,
    images_saved: usize,
}

impl Repl {
    fn greet(&self) {
        let name = self.conversation.persona().display_name();
        if name.is_empty() {
            println!("Hi! I'm IETE Bot. Type /help for commands.");
        } else {
            println!("Hi {name}! I'm IETE Bot. Type /help for commands.");
        }
        if !self.conversation.has_credential() {
            println!(
                "No API key found. Set {API_KEY_ENV_VAR} or add `api_key` to config.toml before chatting."
            );
        }
    }

    async fn handle(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Quit => {}
            Command::Empty => self.send("").await?,
            Command::Help => println!("{}", command::HELP),
            Command::Message(text) => self.send(&text).await?,
            Command::Search(enabled) => {
                self.draft.search = enabled;
                println!("Web search {}.", if enabled { "on" } else { "off" });
            }
            Command::Attach(path) => match attachment::load(&path).await {
                Ok(media) => {
                    println!("Attached {} ({}).", path.display(), media.mime_type);
                    self.draft.attachment = Some(media);
                }
                Err(err) => println!("{err}"),
            },
            Command::Detach => {
                self.draft.attachment = None;
                println!("Attachment removed.");
            }
            Command::Tool(tool) => {
                self.draft.tool = tool;
                match tool {
                    Some(tool) => println!("Next message uses the {tool} tool."),
                    None => println!("Tool cleared."),
                }
            }
            Command::Image {
                aspect_ratio,
                prompt,
            } => self.image(&prompt, aspect_ratio).await?,
            Command::Name(name) => {
                if self.conversation.set_display_name(&name) {
                    println!("Nice to meet you, {}! Starting a fresh conversation.", name.trim());
                }
            }
            Command::Reset => {
                self.conversation.reset();
                println!("Conversation cleared.");
            }
        }
        Ok(())
    }

    async fn send(&mut self, text: &str) -> anyhow::Result<()> {
        let Some(input) = self.draft.take_input(text) else {
            return Ok(());
        };

        let stream = match self.conversation.send(input) {
            Ok(stream) => stream,
            Err(err) => {
                println!("{}", err.user_message());
                return Ok(());
            }
        };
        let mut stream = std::pin::pin!(stream);

        let mut out = std::io::stdout();
        let mut printed = 0;
        let mut last: Option<StreamResult> = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(result) => {
                    let text = result.text();
                    out.write_all(&text.as_bytes()[printed..])?;
                    out.flush()?;
                    printed = text.len();
                    last = Some(result);
                }
                Err(err) => {
                    writeln!(out, "\n{}", err.user_message())?;
                    return Ok(());
                }
            }
        }
        writeln!(out)?;

        let sources: Vec<_> = last.iter().flat_map(|result| result.sources()).collect();
        if !sources.is_empty() {
            writeln!(out, "\nSources:")?;
            for (i, source) in sources.into_iter().enumerate() {
                writeln!(out, "  [{}] {} <{}>", i + 1, source.title, source.uri)?;
            }
        }
        Ok(())
    }

    async fn image(&mut self, prompt: &str, aspect_ratio: AspectRatio) -> anyhow::Result<()> {
        println!("Generating a {aspect_ratio} image...");
        let media = match self.conversation.generate_image(prompt, aspect_ratio).await {
            Ok(Some(media)) => media,
            Ok(None) => {
                println!("No image was produced for that prompt. Try rephrasing it.");
                return Ok(());
            }
            Err(err) => {
                println!("{}", err.user_message());
                return Ok(());
            }
        };

        self.images_saved += 1;
        let dir = std::env::current_dir()?;
        let stem = format!("iete-image-{}", self.images_saved);
        match attachment::save(&media, &dir, &stem).await {
            Ok(path) => println!("Saved image to {}", path.display()),
            Err(err) => println!("{err}"),
        }
        Ok(())
    }
}

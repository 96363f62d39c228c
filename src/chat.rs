// Interactive terminal chat: one verification per line.

use anyhow::Result;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::interpreter::ResponseInterpreter;
use crate::render::render_text;
use crate::request::{InlineImage, VerificationRequest};

pub const HELP: &str = "Paste a forwarded message and press Enter to check it.\n\
/image <path> [text]  attach a screenshot\n\
/help                 show this help\n\
/quit                 leave the chat\n";

#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Verify { text: String, image: Option<PathBuf> },
    Help,
    Quit,
    Empty,
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatCommand::Empty;
        }
        match line.split_once(char::is_whitespace).unwrap_or((line, "")) {
            ("/quit" | "/exit", _) => ChatCommand::Quit,
            ("/help", _) => ChatCommand::Help,
            ("/image", rest) => {
                let rest = rest.trim();
                let (path, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if path.is_empty() {
                    ChatCommand::Help
                } else {
                    ChatCommand::Verify {
                        text: text.trim().to_string(),
                        image: Some(PathBuf::from(path)),
                    }
                }
            }
            _ => ChatCommand::Verify {
                text: line.to_string(),
                image: None,
            },
        }
    }
}

fn prepare(text: String, image: Option<PathBuf>) -> crate::error::Result<VerificationRequest> {
    let image = image.as_deref().map(InlineImage::from_path).transpose()?;
    VerificationRequest::new(text, image)
}

/// Reads submissions from `input` until EOF or `/quit`. A failed verification
/// is reported and the session continues.
pub async fn run_chat<R, W>(interpreter: &ResponseInterpreter, input: R, mut output: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting chat session...");
    output
        .write_all(b"VeriFact Bot. Send me a forwarded message or a screenshot (/help for commands).\n> ")
        .await?;
    output.flush().await?;

    let mut lines = input.lines();
    let mut checked = 0;

    while let Some(line) = lines.next_line().await? {
        let reply = match ChatCommand::parse(&line) {
            ChatCommand::Quit => break,
            ChatCommand::Empty => String::new(),
            ChatCommand::Help => HELP.to_string(),
            ChatCommand::Verify { text, image } => match prepare(text, image) {
                Ok(request) => match interpreter.verify(&request).await {
                    Ok(result) => {
                        checked += 1;
                        render_text(&result)
                    }
                    Err(e) => format!("{e}\n"),
                },
                Err(e) => {
                    warn!("Rejected chat input: {}", e);
                    format!("{e}\n")
                }
            },
        };
        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.write_all(b"\nBye.\n").await?;
    output.flush().await?;
    info!(checked, "Chat session finished.");
    Ok(checked)
}

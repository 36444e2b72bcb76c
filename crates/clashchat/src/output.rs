use std::io::IsTerminal;

use clap::ValueEnum;
use clashchat_session::StatusEvent;
use clashchat_wire::ChatEvent;
use serde::Serialize;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Text
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChatLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    event: &'a ChatEvent,
}

#[derive(Serialize)]
struct StatusLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    status: &'a StatusEvent,
}

pub fn print_chat(event: &ChatEvent, format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            println!("[{}] {}", event.sender, event.text);
        }
        OutputFormat::Json => {
            let line = ChatLine {
                kind: "chat",
                event,
            };
            println!(
                "{}",
                serde_json::to_string(&line).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

pub fn print_status(status: &StatusEvent, format: OutputFormat) {
    match format {
        OutputFormat::Text => match status {
            StatusEvent::Connected => println!("-- connected --"),
            StatusEvent::Reconnecting { attempt } => {
                println!("-- reconnecting (attempt {attempt}) --");
            }
            StatusEvent::HandshakeRejected { reason } => {
                println!("-- handshake rejected (reason {reason}) --");
            }
            StatusEvent::Abandoned { attempts } => {
                println!("-- session abandoned after {attempts} reconnect attempts --");
            }
        },
        OutputFormat::Json => {
            let line = StatusLine {
                kind: "status",
                status,
            };
            println!(
                "{}",
                serde_json::to_string(&line).unwrap_or_else(|_| "{}".to_string())
            );
        }
    }
}

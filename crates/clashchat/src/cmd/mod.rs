use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod gen_config;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach to the chat server and print the broadcast stream.
    Watch(WatchArgs),
    /// Generate a config file from a captured login packet.
    GenConfig(GenConfigArgs),
    /// Decode a single captured frame offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::GenConfig(args) => gen_config::run(args),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Config file produced by `gen-config`.
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct GenConfigArgs {
    /// Captured login packet (raw bytes).
    pub capture: PathBuf,
    /// Chat server hostname or address.
    #[arg(long)]
    pub host: String,
    /// Chat server port.
    #[arg(long, default_value_t = crate::config::DEFAULT_PORT)]
    pub port: u16,
    /// Expected message id of the captured login packet.
    #[arg(long, value_parser = parse_message_id, default_value = "0x0232")]
    pub login_id: u16,
    /// Where to write the config.
    #[arg(long, default_value = "config.json")]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// One complete frame, hex-encoded (header included).
    pub frame: String,
    /// Config file supplying the wire schema.
    #[arg(long)]
    pub config: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_message_id(text: &str) -> Result<u16, String> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| format!("invalid message id: {text}"))
}

use bytes::BytesMut;
use clashchat_frame::decode_frame;
use clashchat_wire::{Decoded, FrameDecoder};

use crate::cmd::DecodeArgs;
use crate::config::ClientConfig;
use crate::exit::{config_error, data_error, CliResult, SUCCESS};
use crate::output::{print_chat, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config =
        ClientConfig::load(&args.config).map_err(|err| config_error("config load failed", err))?;

    let bytes = hex::decode(args.frame.trim()).map_err(|err| data_error("invalid hex", err))?;
    let mut buf = BytesMut::from(bytes.as_slice());

    let frame = decode_frame(&mut buf, config.session.max_frame_size)
        .map_err(|err| data_error("frame decode failed", err))?
        .ok_or_else(|| data_error("frame decode failed", "input is not a complete frame"))?;

    if !buf.is_empty() {
        return Err(data_error(
            "frame decode failed",
            format!("{} trailing bytes after the frame", buf.len()),
        ));
    }

    let decoder = FrameDecoder::new(config.wire.chat.clone());
    match decoder
        .decode(&frame)
        .map_err(|err| data_error("payload decode failed", err))?
    {
        Decoded::Chat(events) => {
            for event in &events {
                print_chat(event, format);
            }
        }
        Decoded::Unrecognized { message_id } => {
            println!(
                "unrecognized frame: message id {message_id:#06x}, {} payload bytes",
                frame.payload.len()
            );
        }
    }

    Ok(SUCCESS)
}

use clashchat_session::{Credentials, HandshakeTemplate, Region, SessionConfig};
use clashchat_wire::{ChatSchema, FieldKind, FieldSpec, ReplySchema, WireSchema};
use tracing::warn;

use crate::cmd::GenConfigArgs;
use crate::config::{ClientConfig, ServerConfig};
use crate::exit::{config_error, data_error, io_error, CliResult, SUCCESS};

// Layout of the captured login packet for the supported client release.
// Header (size u16, id u16), then client_version u32, user_id u64,
// access_key[512], game_id u32. These constants exist only here: at runtime
// the generated config is the sole source of truth.
const HEADER_LEN: usize = 4;
const USER_ID_OFFSET: usize = HEADER_LEN + 4;
const ACCESS_KEY_OFFSET: usize = USER_ID_OFFSET + 8;
const ACCESS_KEY_LEN: usize = 512;
const MIN_CAPTURE_LEN: usize = ACCESS_KEY_OFFSET + ACCESS_KEY_LEN;

pub fn run(args: GenConfigArgs) -> CliResult<i32> {
    let capture = std::fs::read(&args.capture)
        .map_err(|err| io_error("failed to read capture", err))?;

    if capture.len() < MIN_CAPTURE_LEN {
        return Err(data_error(
            "capture too short",
            format!(
                "{} bytes (a complete login packet is at least {MIN_CAPTURE_LEN})",
                capture.len()
            ),
        ));
    }

    let declared_size = u16::from_le_bytes([capture[0], capture[1]]) as usize;
    let message_id = u16::from_le_bytes([capture[2], capture[3]]);

    if message_id != args.login_id {
        return Err(data_error(
            "capture is not a login packet",
            format!(
                "message id {message_id:#06x} (expected {:#06x})",
                args.login_id
            ),
        ));
    }
    if declared_size != capture.len() {
        warn!(
            declared_size,
            capture_len = capture.len(),
            "capture length does not match its declared frame size"
        );
    }

    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&capture[USER_ID_OFFSET..USER_ID_OFFSET + 8]);
    let user_id = u64::from_le_bytes(id_bytes);
    let key_span = &capture[ACCESS_KEY_OFFSET..ACCESS_KEY_OFFSET + ACCESS_KEY_LEN];
    let key_end = key_span.iter().position(|&b| b == 0).unwrap_or(key_span.len());
    let access_key = String::from_utf8_lossy(&key_span[..key_end]).into_owned();

    let template = HandshakeTemplate::new(
        capture,
        Region {
            offset: USER_ID_OFFSET,
            len: 8,
        },
        Region {
            offset: ACCESS_KEY_OFFSET,
            len: ACCESS_KEY_LEN,
        },
    )
    .map_err(|err| data_error("capture does not fit the login layout", err))?;

    let config = ClientConfig {
        server: ServerConfig {
            host: args.host,
            port: args.port,
        },
        credentials: Credentials {
            user_id,
            access_key,
        },
        template,
        wire: observed_wire_schema(),
        session: SessionConfig::default(),
    };

    config
        .store(&args.out)
        .map_err(|err| config_error("config write failed", err))?;

    println!("config written to {}", args.out.display());
    println!("  user_id: {user_id}");
    println!("  server:  {}:{}", config.server.host, config.server.port);
    Ok(SUCCESS)
}

/// The wire layout observed in the capture session this tool supports:
/// accept reply `0x01f8`; world chat `0x03f6` as `chat_type u32, count u64`
/// followed by 184-byte records of
/// `player_id u64, _ u64, _ u32, name[32], text[128], _ u32`.
fn observed_wire_schema() -> WireSchema {
    WireSchema {
        reply: ReplySchema {
            accept_id: 0x01f8,
            reject_id: None,
            reject_reason: None,
        },
        chat: ChatSchema {
            message_id: 0x03f6,
            count: Some(FieldSpec::new(4, FieldKind::U64)),
            records_offset: 12,
            record_len: 184,
            sender: FieldSpec::new(20, FieldKind::Text { len: 32 }),
            sender_id: Some(FieldSpec::new(0, FieldKind::U64)),
            text: FieldSpec::new(52, FieldKind::Text { len: 128 }),
            timestamp: None,
        },
    }
}

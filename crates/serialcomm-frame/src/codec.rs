use bytes::{BufMut, BytesMut};

use crate::checksum::checksum;
use crate::error::Result;
use crate::payload::{put_payload, Message};

/// Magic byte opening every frame: `'!'`.
pub const MAGIC: u8 = b'!';

/// Bytes a frame adds around its payload: magic, type tag, checksum.
pub const FRAME_OVERHEAD: usize = 3;

/// Default inbound backlog, in bytes, above which pending input is discarded.
pub const DEFAULT_HIGH_WATER_MARK: usize = 1000;

/// Default number of messages kept per kind.
pub const DEFAULT_STORE_CAPACITY: usize = 100;

/// Encode a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────────┬──────────────────┬────────────┐
/// │ Magic (1B) │ Type (1B) │ Payload          │ LRC (1B)   │
/// │ 0x21 '!'   │ tag       │ per-kind layout  │ of payload │
/// └────────────┴───────────┴──────────────────┴────────────┘
/// ```
///
/// The value is validated first; on error `dst` is left untouched.
pub fn encode_frame(message: &Message, dst: &mut BytesMut) -> Result<()> {
    message.validate()?;

    dst.reserve(FRAME_OVERHEAD + message.payload_len());
    dst.put_u8(MAGIC);
    dst.put_u8(message.kind().code());
    let payload_start = dst.len();
    put_payload(message, dst);
    let lrc = checksum(&dst[payload_start..]);
    dst.put_u8(lrc);
    Ok(())
}

/// Configuration for the frame receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Inbound backlog above which the whole input buffer is discarded.
    /// Default: 1000 bytes.
    pub high_water_mark: usize,
    /// Messages kept per kind before the oldest is evicted. Default: 100.
    pub store_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            store_capacity: DEFAULT_STORE_CAPACITY,
        }
    }
}

//! Magic-byte framing with LRC checksums and typed payloads for serial links.
//!
//! Every frame on the wire is:
//! - A 1-byte magic (`'!'`) for stream synchronization
//! - A 1-byte type tag selecting the [`MessageKind`]
//! - The payload, laid out per kind
//! - A 1-byte longitudinal redundancy check over the payload
//!
//! The receive side is a resumable state machine that never blocks on the
//! port. Decoded messages land in a bounded per-kind [`MessageStore`].

pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod kind;
pub mod payload;
pub mod reader;
pub mod store;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use checksum::{checksum, Lrc};
pub use codec::{
    encode_frame, ReceiverConfig, DEFAULT_HIGH_WATER_MARK, DEFAULT_STORE_CAPACITY,
    FRAME_OVERHEAD, MAGIC,
};
pub use decoder::{DecodeEvent, DecoderState, DropReason, FrameDecoder};
pub use error::{FrameError, PayloadError, Result};
pub use kind::{MessageKind, ParseKindError, PayloadShape};
pub use payload::{
    decode_payload, encode_payload, required_len, Message, MAX_TEXT_LEN, TEXT_PREFIX_LEN,
    THROTTLE_RANGE,
};
pub use reader::{FrameReceiver, ProcessSummary, ReceiverStats, Step};
pub use store::MessageStore;
#[cfg(feature = "async")]
pub use tokio_codec::FrameCodec;
pub use writer::FrameWriter;

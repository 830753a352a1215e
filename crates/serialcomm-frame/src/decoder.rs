//! Byte-at-a-time frame state machine.
//!
//! The decoder holds everything an in-flight frame needs (resolved kind,
//! payload bytes so far, running checksum), so a frame can be fed across any
//! number of calls and resumes exactly where the last byte left it.

use bytes::{Buf, BytesMut};

use crate::checksum::Lrc;
use crate::codec::MAGIC;
use crate::error::PayloadError;
use crate::kind::MessageKind;
use crate::payload::{decode_payload, required_len, Message};

/// Which part of a frame the decoder is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Scanning for the magic byte.
    Idle,
    /// Magic seen, waiting for the type tag.
    TypeExpected,
    /// Collecting payload bytes for a known kind.
    PayloadExpected(MessageKind),
    /// Payload complete, waiting for the check byte.
    ChecksumExpected(MessageKind),
}

/// Why a frame was thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The byte after the magic is not a known type tag.
    UnknownType(u8),
    /// The trailing byte does not match the payload checksum.
    ChecksumMismatch {
        kind: MessageKind,
        expected: u8,
        received: u8,
    },
    /// The checksum matched but the payload is not a valid value.
    InvalidPayload { kind: MessageKind, error: PayloadError },
}

/// Something the decoder noticed while consuming a byte.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// A byte outside any frame was skipped.
    Noise(u8),
    /// A frame passed its checksum and decoded cleanly.
    Decoded(Message),
    /// A frame was abandoned; the decoder is back in [`DecoderState::Idle`].
    Dropped(DropReason),
}

enum State {
    Idle,
    TypeExpected,
    PayloadExpected {
        kind: MessageKind,
        lrc: Lrc,
    },
    ChecksumExpected {
        kind: MessageKind,
        expected: u8,
        decoded: Result<Message, PayloadError>,
    },
}

/// Incremental frame decoder.
///
/// Feed it bytes with [`push`](FrameDecoder::push) or
/// [`decode`](FrameDecoder::decode). Bytes of an unknown frame are not skipped
/// by length, because the length is unknown: scanning for the next magic byte
/// resumes right after the bad type tag, and payload bytes that happen to equal
/// `'!'` can open a bogus frame. Its checksum will almost always reject it.
pub struct FrameDecoder {
    state: State,
    payload: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            payload: BytesMut::new(),
        }
    }

    pub fn state(&self) -> DecoderState {
        match &self.state {
            State::Idle => DecoderState::Idle,
            State::TypeExpected => DecoderState::TypeExpected,
            State::PayloadExpected { kind, .. } => DecoderState::PayloadExpected(*kind),
            State::ChecksumExpected { kind, .. } => DecoderState::ChecksumExpected(*kind),
        }
    }

    /// True when no frame is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// How many more bytes the current state can take before something
    /// happens. Reading at most this many bytes never overshoots a frame
    /// boundary.
    pub fn wants(&self) -> usize {
        match &self.state {
            State::PayloadExpected { kind, .. } => match required_len(*kind, &self.payload) {
                Err(PayloadError::Incomplete { needed }) => needed - self.payload.len(),
                _ => 1,
            },
            _ => 1,
        }
    }

    /// Abandon any frame in progress.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.payload.clear();
    }

    /// Consume one byte.
    pub fn push(&mut self, byte: u8) -> Option<DecodeEvent> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {
                if byte == MAGIC {
                    self.state = State::TypeExpected;
                    None
                } else {
                    Some(DecodeEvent::Noise(byte))
                }
            }
            State::TypeExpected => match MessageKind::from_code(byte) {
                Some(kind) => {
                    self.payload.clear();
                    self.state = State::PayloadExpected {
                        kind,
                        lrc: Lrc::new(),
                    };
                    None
                }
                None => Some(DecodeEvent::Dropped(DropReason::UnknownType(byte))),
            },
            State::PayloadExpected { kind, mut lrc } => {
                self.payload.extend_from_slice(&[byte]);
                lrc.update(&[byte]);
                self.state = match decode_payload(kind, &self.payload) {
                    Err(PayloadError::Incomplete { .. }) => State::PayloadExpected { kind, lrc },
                    decoded => State::ChecksumExpected {
                        kind,
                        expected: lrc.finish(),
                        decoded: decoded.map(|(message, _)| message),
                    },
                };
                None
            }
            State::ChecksumExpected {
                kind,
                expected,
                decoded,
            } => {
                self.payload.clear();
                if byte != expected {
                    return Some(DecodeEvent::Dropped(DropReason::ChecksumMismatch {
                        kind,
                        expected,
                        received: byte,
                    }));
                }
                Some(match decoded {
                    Ok(message) => DecodeEvent::Decoded(message),
                    Err(error) => DecodeEvent::Dropped(DropReason::InvalidPayload { kind, error }),
                })
            }
        }
    }

    /// Consume bytes from `src` until a frame is decoded or dropped, or `src`
    /// runs out. Noise is skipped silently.
    pub fn decode<B: Buf>(&mut self, src: &mut B) -> Option<DecodeEvent> {
        while src.has_remaining() {
            match self.push(src.get_u8()) {
                None | Some(DecodeEvent::Noise(_)) => {}
                Some(event) => return Some(event),
            }
        }
        None
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("state", &self.state())
            .field("buffered", &self.payload.len())
            .finish()
    }
}

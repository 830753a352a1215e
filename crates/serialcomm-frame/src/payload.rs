use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, PayloadError, Result};
use crate::kind::MessageKind;

/// Length of the prefix in front of text payloads.
pub const TEXT_PREFIX_LEN: usize = 2;

/// Longest text payload the 16-bit prefix can describe.
pub const MAX_TEXT_LEN: usize = u16::MAX as usize;

/// Inclusive domain of [`Message::ThrottleSetting`].
pub const THROTTLE_RANGE: std::ops::RangeInclusive<i16> = 0..=100;

/// A decoded message: its kind and its value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    Debug(String),
    Error(String),
    Timestamp(i32),
    PowerSetting(bool),
    /// Percentage, 0 to 100 inclusive.
    ThrottleSetting(i16),
    MaxCurrent(f32),
    MaxVoltage(f32),
    Thrust(f32),
    RotSpeed(f32),
    Current(f32),
    Voltage(f32),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Debug(_) => MessageKind::Debug,
            Message::Error(_) => MessageKind::Error,
            Message::Timestamp(_) => MessageKind::Timestamp,
            Message::PowerSetting(_) => MessageKind::PowerSetting,
            Message::ThrottleSetting(_) => MessageKind::ThrottleSetting,
            Message::MaxCurrent(_) => MessageKind::MaxCurrent,
            Message::MaxVoltage(_) => MessageKind::MaxVoltage,
            Message::Thrust(_) => MessageKind::Thrust,
            Message::RotSpeed(_) => MessageKind::RotSpeed,
            Message::Current(_) => MessageKind::Current,
            Message::Voltage(_) => MessageKind::Voltage,
        }
    }

    /// Check the value against its kind's domain.
    pub fn validate(&self) -> Result<()> {
        match self {
            Message::Debug(text) | Message::Error(text) if text.len() > MAX_TEXT_LEN => {
                Err(FrameError::TextTooLong {
                    len: text.len(),
                    max: MAX_TEXT_LEN,
                })
            }
            Message::ThrottleSetting(value) if !THROTTLE_RANGE.contains(value) => {
                Err(FrameError::Constraint {
                    kind: MessageKind::ThrottleSetting,
                    reason: format!(
                        "{value} is outside {}..={}",
                        THROTTLE_RANGE.start(),
                        THROTTLE_RANGE.end()
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// Encoded payload length, excluding magic, type and checksum bytes.
    pub fn payload_len(&self) -> usize {
        match self {
            Message::Debug(text) | Message::Error(text) => TEXT_PREFIX_LEN + text.len(),
            other => other.kind().shape().fixed_len().unwrap_or(0),
        }
    }
}

/// Encode a message's payload into `dst`.
///
/// Nothing is written when the value fails [`Message::validate`].
pub fn encode_payload(message: &Message, dst: &mut BytesMut) -> Result<()> {
    message.validate()?;
    put_payload(message, dst);
    Ok(())
}

/// Write a payload that has already been validated.
pub(crate) fn put_payload(message: &Message, dst: &mut BytesMut) {
    dst.reserve(message.payload_len());
    match message {
        Message::Debug(text) | Message::Error(text) => {
            dst.put_u16(text.len() as u16);
            dst.put_slice(text.as_bytes());
        }
        Message::Timestamp(value) => dst.put_i32(*value),
        Message::PowerSetting(on) => dst.put_i16(i16::from(*on)),
        Message::ThrottleSetting(value) => dst.put_i16(*value),
        Message::MaxCurrent(value)
        | Message::MaxVoltage(value)
        | Message::Thrust(value)
        | Message::RotSpeed(value)
        | Message::Current(value)
        | Message::Voltage(value) => dst.put_f32_le(*value),
    }
}

/// Total payload length for `kind`, judged from the bytes received so far.
///
/// Fixed-width kinds know their length up front. Text needs its two prefix
/// bytes first; until they arrive this reports the prefix length as needed.
pub fn required_len(kind: MessageKind, src: &[u8]) -> std::result::Result<usize, PayloadError> {
    let needed = match kind.shape().fixed_len() {
        Some(len) => len,
        None if src.len() < TEXT_PREFIX_LEN => TEXT_PREFIX_LEN,
        None => TEXT_PREFIX_LEN + u16::from_be_bytes([src[0], src[1]]) as usize,
    };
    if src.len() < needed {
        return Err(PayloadError::Incomplete { needed });
    }
    Ok(needed)
}

/// Decode a `kind` payload from the front of `src`.
///
/// Returns the message and the number of bytes it occupied. Bytes past the
/// payload are ignored.
pub fn decode_payload(
    kind: MessageKind,
    src: &[u8],
) -> std::result::Result<(Message, usize), PayloadError> {
    let consumed = required_len(kind, src)?;
    let body = &src[..consumed];

    let message = match kind {
        MessageKind::Debug => Message::Debug(read_text(body)?),
        MessageKind::Error => Message::Error(read_text(body)?),
        MessageKind::Timestamp => Message::Timestamp(i32::from_be_bytes(array(body))),
        MessageKind::PowerSetting => match i16::from_be_bytes(array(body)) {
            0 => Message::PowerSetting(false),
            1 => Message::PowerSetting(true),
            other => {
                return Err(PayloadError::OutOfRange {
                    kind,
                    value: i64::from(other),
                })
            }
        },
        MessageKind::ThrottleSetting => {
            let value = i16::from_be_bytes(array(body));
            if !THROTTLE_RANGE.contains(&value) {
                return Err(PayloadError::OutOfRange {
                    kind,
                    value: i64::from(value),
                });
            }
            Message::ThrottleSetting(value)
        }
        MessageKind::MaxCurrent => Message::MaxCurrent(f32::from_le_bytes(array(body))),
        MessageKind::MaxVoltage => Message::MaxVoltage(f32::from_le_bytes(array(body))),
        MessageKind::Thrust => Message::Thrust(f32::from_le_bytes(array(body))),
        MessageKind::RotSpeed => Message::RotSpeed(f32::from_le_bytes(array(body))),
        MessageKind::Current => Message::Current(f32::from_le_bytes(array(body))),
        MessageKind::Voltage => Message::Voltage(f32::from_le_bytes(array(body))),
    };

    Ok((message, consumed))
}

fn read_text(body: &[u8]) -> std::result::Result<String, PayloadError> {
    std::str::from_utf8(&body[TEXT_PREFIX_LEN..])
        .map(str::to_owned)
        .map_err(|_| PayloadError::InvalidUtf8)
}

/// Copy the first `N` bytes; callers have checked the length.
fn array<const N: usize>(body: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&body[..N]);
    out
}

//! Message kinds and their type tags.
//!
//! Tags 0x30-0x32 travel in both directions, 0x36-0x39 are host-to-device
//! settings, 0x40-0x43 are device-to-host telemetry.

use std::fmt;
use std::str::FromStr;

/// Wire layout of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// u16 big-endian length followed by that many UTF-8 bytes.
    Text,
    /// i32 big-endian.
    I32Be,
    /// i16 big-endian.
    I16Be,
    /// f32 little-endian.
    F32Le,
}

impl PayloadShape {
    /// Payload length for fixed-width shapes, `None` for text.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            PayloadShape::Text => None,
            PayloadShape::I32Be => Some(4),
            PayloadShape::I16Be => Some(2),
            PayloadShape::F32Le => Some(4),
        }
    }
}

/// The closed set of message kinds carried by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageKind {
    Debug = 0x30,
    Error = 0x31,
    Timestamp = 0x32,
    PowerSetting = 0x36,
    ThrottleSetting = 0x37,
    MaxCurrent = 0x38,
    MaxVoltage = 0x39,
    Thrust = 0x40,
    RotSpeed = 0x41,
    Current = 0x42,
    Voltage = 0x43,
}

impl MessageKind {
    /// Every kind, in tag order.
    pub const ALL: [MessageKind; 11] = [
        MessageKind::Debug,
        MessageKind::Error,
        MessageKind::Timestamp,
        MessageKind::PowerSetting,
        MessageKind::ThrottleSetting,
        MessageKind::MaxCurrent,
        MessageKind::MaxVoltage,
        MessageKind::Thrust,
        MessageKind::RotSpeed,
        MessageKind::Current,
        MessageKind::Voltage,
    ];

    /// Number of kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Resolve a type tag. Returns `None` for tags the protocol does not define.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x30 => Some(MessageKind::Debug),
            0x31 => Some(MessageKind::Error),
            0x32 => Some(MessageKind::Timestamp),
            0x36 => Some(MessageKind::PowerSetting),
            0x37 => Some(MessageKind::ThrottleSetting),
            0x38 => Some(MessageKind::MaxCurrent),
            0x39 => Some(MessageKind::MaxVoltage),
            0x40 => Some(MessageKind::Thrust),
            0x41 => Some(MessageKind::RotSpeed),
            0x42 => Some(MessageKind::Current),
            0x43 => Some(MessageKind::Voltage),
            _ => None,
        }
    }

    /// The type tag written after the magic byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Stable key used when kinds are addressed by name.
    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Debug => "Debug",
            MessageKind::Error => "Error",
            MessageKind::Timestamp => "Timestamp",
            MessageKind::PowerSetting => "PowerSetting",
            MessageKind::ThrottleSetting => "ThrottleSetting",
            MessageKind::MaxCurrent => "MaxCurrent",
            MessageKind::MaxVoltage => "MaxVoltage",
            MessageKind::Thrust => "Thrust",
            MessageKind::RotSpeed => "RotSpeed",
            MessageKind::Current => "Current",
            MessageKind::Voltage => "Voltage",
        }
    }

    pub fn shape(self) -> PayloadShape {
        match self {
            MessageKind::Debug | MessageKind::Error => PayloadShape::Text,
            MessageKind::Timestamp => PayloadShape::I32Be,
            MessageKind::PowerSetting | MessageKind::ThrottleSetting => PayloadShape::I16Be,
            MessageKind::MaxCurrent
            | MessageKind::MaxVoltage
            | MessageKind::Thrust
            | MessageKind::RotSpeed
            | MessageKind::Current
            | MessageKind::Voltage => PayloadShape::F32Le,
        }
    }

    /// Dense index in `0..COUNT`, in tag order.
    pub fn index(self) -> usize {
        match self {
            MessageKind::Debug => 0,
            MessageKind::Error => 1,
            MessageKind::Timestamp => 2,
            MessageKind::PowerSetting => 3,
            MessageKind::ThrottleSetting => 4,
            MessageKind::MaxCurrent => 5,
            MessageKind::MaxVoltage => 6,
            MessageKind::Thrust => 7,
            MessageKind::RotSpeed => 8,
            MessageKind::Current => 9,
            MessageKind::Voltage => 10,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no known message kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for MessageKind {
    type Err = ParseKindError;

    /// Accepts the kind name in any case, with or without `_`, `-` or spaces
    /// between words (`RotSpeed`, `rot_speed`, `Rot Speed`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

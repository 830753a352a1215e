use crate::kind::MessageKind;

/// Errors that can occur while sending or receiving frames.
///
/// Only failures the caller has to act on show up here. Corrupted or unknown
/// frames on the inbound side are dropped by the receiver and reported through
/// its statistics instead.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The value does not fit the domain of its message kind.
    #[error("{kind} value rejected: {reason}")]
    Constraint { kind: MessageKind, reason: String },

    /// A text payload is longer than its 16-bit length prefix can describe.
    #[error("text payload too long ({len} bytes, max {max})")]
    TextTooLong { len: usize, max: usize },

    /// The serial port failed.
    #[error("transport error: {0}")]
    Transport(#[from] serialcomm_transport::TransportError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Reasons a payload could not be turned into a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Fewer bytes are available than the payload needs. `needed` is the total
    /// payload length known so far.
    #[error("incomplete payload (need {needed} bytes)")]
    Incomplete { needed: usize },

    /// A text payload is not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// A setting arrived with a value outside its domain.
    #[error("{kind} value {value} out of range")]
    OutOfRange { kind: MessageKind, value: i64 },
}

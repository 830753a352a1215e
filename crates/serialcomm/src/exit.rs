use std::fmt;
use std::io;

use serialcomm_frame::FrameError;
use serialcomm_link::LinkError;
use serialcomm_transport::TransportError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn data_invalid(message: impl Into<String>) -> Self {
        Self::new(DATA_INVALID, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::InvalidData => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Disconnected => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Constraint { .. } | FrameError::TextTooLong { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Transport(err) => transport_error(context, err),
        LinkError::Frame(err) => frame_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use serialcomm_frame::MessageKind;

    use super::*;

    #[test]
    fn constraint_maps_to_data_invalid() {
        let err = frame_error(
            "encode",
            FrameError::Constraint {
                kind: MessageKind::ThrottleSetting,
                reason: "too high".to_string(),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("encode: "));
    }

    #[test]
    fn disconnect_maps_to_transport_error() {
        let err = link_error("decode", LinkError::Transport(TransportError::Disconnected));
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn missing_file_is_usage_error() {
        let err = io_error("read", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.code, USAGE);
    }
}

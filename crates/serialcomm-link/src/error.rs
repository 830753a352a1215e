/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] serialcomm_transport::TransportError),

    /// Frame-level error, including rejected values on send.
    #[error("frame error: {0}")]
    Frame(#[from] serialcomm_frame::FrameError),
}

impl LinkError {
    /// True when the caller passed a value outside its kind's domain. Nothing
    /// was written in that case.
    pub fn is_rejected_value(&self) -> bool {
        matches!(
            self,
            LinkError::Frame(
                serialcomm_frame::FrameError::Constraint { .. }
                    | serialcomm_frame::FrameError::TextTooLong { .. }
            )
        )
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

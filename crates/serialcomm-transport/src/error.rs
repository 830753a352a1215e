/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the port.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The other end of the link went away.
    #[error("transport disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;

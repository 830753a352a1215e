//! Framed, checksummed message exchange over serial links.
//!
//! serialcomm carries a closed set of typed messages (text, timestamps,
//! settings and telemetry) between a host and a device over a byte-oriented
//! serial port, with magic-byte framing and an LRC check byte per frame.
//!
//! # Crate Structure
//!
//! - [`transport`]: the `SerialPort` abstraction and an in-memory port
//! - [`frame`]: wire format, payload codec, receiver state machine, store
//! - [`link`]: one send/receive session over one port (behind `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use serialcomm_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serialcomm_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use serialcomm_link::*;
}

//! Serial port abstraction.
//!
//! The framing layer never opens, configures, or closes a port. It only needs
//! a handle that can report how many inbound bytes are buffered, read some of
//! them, write and flush outbound bytes, and throw the inbound buffer away.
//! That contract is the [`SerialPort`] trait.
//!
//! [`MemoryPort`] is an in-process implementation used by tests and by the
//! offline CLI tooling.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, TransportError};
pub use memory::MemoryPort;
pub use traits::SerialPort;

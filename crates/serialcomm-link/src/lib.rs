//! Session-level send and receive over a single serial port.
//!
//! A [`Link`] owns both directions of one port: typed sends on the way out,
//! and a step-wise receiver feeding a shared [`MessageStore`] on the way in.
//!
//! [`MessageStore`]: serialcomm_frame::MessageStore

pub mod connector;
pub mod error;
pub mod link;

pub use connector::{open, open_with_config};
pub use error::{LinkError, Result};
pub use link::{Link, LinkConfig};

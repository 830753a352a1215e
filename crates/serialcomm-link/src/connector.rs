use serialcomm_frame::{FrameReceiver, FrameWriter};
use serialcomm_transport::SerialPort;
use tracing::debug;

use crate::error::Result;
use crate::link::{Link, LinkConfig};

/// Open a link over `port` with default configuration.
pub fn open<T: SerialPort>(port: T) -> Result<Link<T>> {
    open_with_config(port, LinkConfig::default())
}

/// Open a link with explicit configuration.
///
/// The port is cloned once: the receiver reads from the clone, the writer
/// keeps `port`.
pub fn open_with_config<T: SerialPort>(port: T, config: LinkConfig) -> Result<Link<T>> {
    let reader_port = port.try_clone()?;
    let receiver = FrameReceiver::with_config(reader_port, config.receiver);
    let writer = FrameWriter::new(port);

    debug!(
        high_water_mark = config.receiver.high_water_mark,
        store_capacity = config.receiver.store_capacity,
        "link opened"
    );
    Ok(Link::from_parts(receiver, writer, config))
}

use bytes::BytesMut;
use serialcomm_transport::SerialPort;
use tracing::debug;

use crate::codec::encode_frame;
use crate::error::{FrameError, Result};
use crate::kind::MessageKind;
use crate::payload::Message;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete frames to a serial port.
///
/// Every send validates the value first, so a rejected value never puts a
/// single byte on the wire.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: SerialPort> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode a message, write the whole frame and flush.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        encode_frame(message, &mut self.buf)?;

        self.inner.write_all(&self.buf)?;
        self.inner.flush()?;
        debug!(kind = %message.kind(), bytes = self.buf.len(), "frame sent");
        Ok(())
    }

    pub fn send_debug(&mut self, text: impl Into<String>) -> Result<()> {
        self.send(&Message::Debug(text.into()))
    }

    pub fn send_error(&mut self, text: impl Into<String>) -> Result<()> {
        self.send(&Message::Error(text.into()))
    }

    pub fn send_timestamp(&mut self, value: i32) -> Result<()> {
        self.send(&Message::Timestamp(value))
    }

    pub fn send_power_setting(&mut self, on: bool) -> Result<()> {
        self.send(&Message::PowerSetting(on))
    }

    /// Send a power setting given as an integer. Only 0 and 1 are accepted.
    pub fn send_power_setting_value(&mut self, value: i16) -> Result<()> {
        let on = match value {
            0 => false,
            1 => true,
            other => {
                return Err(FrameError::Constraint {
                    kind: MessageKind::PowerSetting,
                    reason: format!("{other} is not 0 or 1"),
                })
            }
        };
        self.send_power_setting(on)
    }

    /// Send a throttle percentage. Values outside 0..=100 are rejected.
    pub fn send_throttle_setting(&mut self, percent: i16) -> Result<()> {
        self.send(&Message::ThrottleSetting(percent))
    }

    pub fn send_max_current(&mut self, amps: f32) -> Result<()> {
        self.send(&Message::MaxCurrent(amps))
    }

    pub fn send_max_voltage(&mut self, volts: f32) -> Result<()> {
        self.send(&Message::MaxVoltage(volts))
    }

    /// Flush the underlying port.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Borrow the underlying port.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying port.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner port.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> std::fmt::Debug for FrameWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serialcomm_transport::{MemoryPort, TransportError};

    use super::*;

    fn writer() -> (FrameWriter<MemoryPort>, MemoryPort) {
        let port = MemoryPort::new();
        let line = port.clone();
        (FrameWriter::new(port), line)
    }

    #[test]
    fn timestamp_wire_bytes() {
        let (mut writer, line) = writer();
        writer.send_timestamp(1234).unwrap();
        assert_eq!(
            line.take_written(),
            vec![0x21, 0x32, 0x00, 0x00, 0x04, 0xD2, 0x2B]
        );
    }

    #[test]
    fn every_send_flushes() {
        let (mut writer, line) = writer();
        writer.send_debug("boot").unwrap();
        writer.send_max_current(12.5).unwrap();
        assert_eq!(line.flush_count(), 2);
    }

    #[test]
    fn power_setting_encodes_as_zero_or_one() {
        let (mut writer, line) = writer();
        writer.send_power_setting(true).unwrap();
        writer.send_power_setting_value(0).unwrap();
        assert_eq!(
            line.take_written(),
            vec![0x21, 0x36, 0x00, 0x01, 0x00, 0x21, 0x36, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn power_setting_value_out_of_domain_writes_nothing() {
        let (mut writer, line) = writer();
        for value in [2, -1, 255] {
            let err = writer.send_power_setting_value(value).unwrap_err();
            assert!(matches!(
                err,
                FrameError::Constraint {
                    kind: MessageKind::PowerSetting,
                    ..
                }
            ));
        }
        assert_eq!(line.pending_output(), 0);
        assert_eq!(line.flush_count(), 0);
    }

    #[test]
    fn throttle_bounds() {
        let (mut writer, line) = writer();
        writer.send_throttle_setting(0).unwrap();
        writer.send_throttle_setting(100).unwrap();
        let sent = line.take_written().len();
        assert_eq!(sent, 10);

        assert!(writer.send_throttle_setting(101).is_err());
        assert!(writer.send_throttle_setting(-1).is_err());
        assert_eq!(line.pending_output(), 0);
    }

    #[test]
    fn oversized_text_is_rejected() {
        let (mut writer, line) = writer();
        let err = writer
            .send_error("x".repeat(crate::payload::MAX_TEXT_LEN + 1))
            .unwrap_err();
        assert!(matches!(err, FrameError::TextTooLong { .. }));
        assert_eq!(line.pending_output(), 0);
    }

    #[test]
    fn float_payload_is_little_endian() {
        let (mut writer, line) = writer();
        writer.send_max_voltage(1.0).unwrap();
        let bytes = line.take_written();
        assert_eq!(&bytes[..2], &[0x21, 0x39]);
        assert_eq!(&bytes[2..6], &1.0f32.to_le_bytes());
    }

    #[test]
    fn transport_failure_propagates() {
        let (mut writer, line) = writer();
        line.disconnect();
        let err = writer.send_timestamp(1).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Disconnected)
        ));
    }

    #[test]
    fn explicit_flush_reaches_port() {
        let (mut writer, line) = writer();
        writer.flush().unwrap();
        assert_eq!(line.flush_count(), 1);
        assert_eq!(writer.get_ref().flush_count(), 1);

        writer.get_mut().write_all(&[0x21]).unwrap();
        assert_eq!(line.pending_output(), 1);

        writer.send_timestamp(1234).unwrap();
        let port = writer.into_inner();
        assert_eq!(port.flush_count(), 2);
        assert_eq!(
            port.take_written(),
            vec![0x21, 0x21, 0x32, 0x00, 0x00, 0x04, 0xD2, 0x2B]
        );
    }
}

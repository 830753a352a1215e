use crate::error::Result;

/// A connected serial link, seen from one end.
///
/// Implementations wrap whatever the platform offers (a UART driver, a USB CDC
/// device, an in-memory queue). The framing layer relies on these semantics:
///
/// - [`read`](SerialPort::read) never waits for more data than is already
///   buffered. It may return fewer bytes than requested, including zero.
/// - [`write_all`](SerialPort::write_all) followed by
///   [`flush`](SerialPort::flush) hands every byte to the link.
/// - Handles obtained through [`try_clone`](SerialPort::try_clone) refer to the
///   same link, and concurrent writes through them do not interleave within a
///   single `write_all` call.
pub trait SerialPort {
    /// Number of inbound bytes currently buffered and readable without waiting.
    fn bytes_available(&self) -> Result<usize>;

    /// Read up to `buf.len()` buffered bytes, returning how many were read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer to the link.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Push any outbound bytes held by the port onto the link.
    fn flush(&mut self) -> Result<()>;

    /// Drop every inbound byte currently buffered.
    fn discard_input(&mut self) -> Result<()>;

    /// Open a second handle onto the same link.
    fn try_clone(&self) -> Result<Self>
    where
        Self: Sized;
}

/// Boxed ports forward to the port they hold.
impl<P: SerialPort> SerialPort for Box<P> {
    fn bytes_available(&self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }

    fn try_clone(&self) -> Result<Self> {
        Ok(Box::new((**self).try_clone()?))
    }
}

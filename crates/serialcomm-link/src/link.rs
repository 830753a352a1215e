use std::sync::Arc;

use serialcomm_frame::{
    DecoderState, FrameReceiver, FrameWriter, Message, MessageStore, ProcessSummary,
    ReceiverConfig, ReceiverStats, Step,
};
use serialcomm_transport::SerialPort;

use crate::error::Result;

/// Configuration for a [`Link`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkConfig {
    pub receiver: ReceiverConfig,
}

/// One session over one serial port.
///
/// Sends go out immediately and synchronously. Inbound bytes are only looked
/// at when the owner calls [`process`](Link::process) or
/// [`step`](Link::step); nothing runs in the background.
pub struct Link<T> {
    receiver: FrameReceiver<T>,
    writer: FrameWriter<T>,
    config: LinkConfig,
}

impl<T: SerialPort> Link<T> {
    pub(crate) fn from_parts(
        receiver: FrameReceiver<T>,
        writer: FrameWriter<T>,
        config: LinkConfig,
    ) -> Self {
        Self {
            receiver,
            writer,
            config,
        }
    }

    /// Send any message.
    pub fn send(&mut self, message: &Message) -> Result<()> {
        self.writer.send(message)?;
        Ok(())
    }

    pub fn send_debug(&mut self, text: impl Into<String>) -> Result<()> {
        self.writer.send_debug(text)?;
        Ok(())
    }

    pub fn send_error(&mut self, text: impl Into<String>) -> Result<()> {
        self.writer.send_error(text)?;
        Ok(())
    }

    pub fn send_timestamp(&mut self, value: i32) -> Result<()> {
        self.writer.send_timestamp(value)?;
        Ok(())
    }

    pub fn send_power_setting(&mut self, on: bool) -> Result<()> {
        self.writer.send_power_setting(on)?;
        Ok(())
    }

    /// Integer form of [`send_power_setting`](Link::send_power_setting);
    /// anything but 0 or 1 is rejected.
    pub fn send_power_setting_value(&mut self, value: i16) -> Result<()> {
        self.writer.send_power_setting_value(value)?;
        Ok(())
    }

    pub fn send_throttle_setting(&mut self, percent: i16) -> Result<()> {
        self.writer.send_throttle_setting(percent)?;
        Ok(())
    }

    pub fn send_max_current(&mut self, amps: f32) -> Result<()> {
        self.writer.send_max_current(amps)?;
        Ok(())
    }

    pub fn send_max_voltage(&mut self, volts: f32) -> Result<()> {
        self.writer.send_max_voltage(volts)?;
        Ok(())
    }

    /// Advance the receiver by up to `max_steps` steps.
    pub fn process(&mut self, max_steps: usize) -> Result<ProcessSummary> {
        Ok(self.receiver.process(max_steps)?)
    }

    /// Advance the receiver by at most one frame.
    pub fn step(&mut self) -> Result<Step> {
        Ok(self.receiver.step()?)
    }

    pub fn store(&self) -> &MessageStore {
        self.receiver.store()
    }

    /// Shared handle to the store for consumers on other threads.
    pub fn store_handle(&self) -> Arc<MessageStore> {
        self.receiver.store_handle()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.receiver.stats()
    }

    pub fn receiver_state(&self) -> DecoderState {
        self.receiver.state()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Borrow the port handle used for sending.
    pub fn port(&self) -> &T {
        self.writer.get_ref()
    }

    /// Split the link back into its receiver and writer.
    pub fn into_parts(self) -> (FrameReceiver<T>, FrameWriter<T>) {
        (self.receiver, self.writer)
    }
}

impl<T> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("receiver", &self.receiver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

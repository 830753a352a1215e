use std::sync::Arc;

use serialcomm_transport::SerialPort;
use tracing::{debug, trace, warn};

use crate::codec::ReceiverConfig;
use crate::decoder::{DecodeEvent, DecoderState, DropReason, FrameDecoder};
use crate::error::Result;
use crate::kind::MessageKind;
use crate::store::MessageStore;

const READ_CHUNK_SIZE: usize = 256;

/// Outcome of a single processing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing buffered and no frame in progress.
    Idle,
    /// A frame is in progress but the port has no more bytes yet. The partial
    /// frame is kept and resumes on the next step.
    Incomplete,
    /// A frame decoded and its message was stored.
    Decoded(MessageKind),
    /// A frame was discarded.
    Dropped(DropReason),
    /// The inbound backlog exceeded the high-water mark and was discarded.
    Flushed { bytes: usize },
}

/// Totals over one [`FrameReceiver::process`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub steps: usize,
    pub decoded: usize,
    pub dropped: usize,
    pub flushed_bytes: usize,
}

/// Running counters of everything the receiver has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub frames_decoded: u64,
    pub checksum_failures: u64,
    pub unknown_types: u64,
    pub invalid_payloads: u64,
    pub noise_bytes: u64,
    pub overflow_flushes: u64,
    pub bytes_flushed: u64,
}

impl ReceiverStats {
    /// Frames that were started but not stored, for any reason.
    pub fn frames_dropped(&self) -> u64 {
        self.checksum_failures + self.unknown_types + self.invalid_payloads
    }
}

/// Decodes frames arriving on a serial port into a [`MessageStore`].
///
/// Processing is step-wise and never waits on the port: each
/// [`step`](FrameReceiver::step) reads only bytes that are already buffered,
/// and stops after at most one frame.
pub struct FrameReceiver<T> {
    inner: T,
    decoder: FrameDecoder,
    store: Arc<MessageStore>,
    stats: ReceiverStats,
    config: ReceiverConfig,
}

impl<T: SerialPort> FrameReceiver<T> {
    /// Create a new receiver with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ReceiverConfig::default())
    }

    /// Create a new receiver with explicit configuration.
    pub fn with_config(inner: T, config: ReceiverConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(),
            store: Arc::new(MessageStore::new(config.store_capacity)),
            stats: ReceiverStats::default(),
            config,
        }
    }

    /// Run up to `max_steps` steps, stopping early once the port has nothing
    /// more to give.
    pub fn process(&mut self, max_steps: usize) -> Result<ProcessSummary> {
        let mut summary = ProcessSummary::default();
        for _ in 0..max_steps {
            let step = self.step()?;
            summary.steps += 1;
            match step {
                Step::Idle | Step::Incomplete => break,
                Step::Decoded(_) => summary.decoded += 1,
                Step::Dropped(_) => summary.dropped += 1,
                Step::Flushed { bytes } => summary.flushed_bytes += bytes,
            }
        }
        Ok(summary)
    }

    /// Advance the state machine by at most one frame.
    ///
    /// A transport error abandons the frame in progress and is returned; the
    /// receiver stays usable.
    pub fn step(&mut self) -> Result<Step> {
        let result = self.advance();
        if result.is_err() {
            self.decoder.reset();
        }
        result
    }

    fn advance(&mut self) -> Result<Step> {
        let buffered = self.inner.bytes_available()?;
        if buffered > self.config.high_water_mark {
            self.inner.discard_input()?;
            self.decoder.reset();
            self.stats.overflow_flushes += 1;
            self.stats.bytes_flushed += buffered as u64;
            warn!(
                bytes = buffered,
                high_water_mark = self.config.high_water_mark,
                "inbound backlog over high-water mark, discarding"
            );
            return Ok(Step::Flushed { bytes: buffered });
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            let available = self.inner.bytes_available()?;
            let wanted = self.decoder.wants().min(available).min(READ_CHUNK_SIZE);
            if wanted == 0 {
                return Ok(self.pending());
            }

            let read = self.inner.read(&mut chunk[..wanted])?;
            if read == 0 {
                return Ok(self.pending());
            }

            for &byte in &chunk[..read] {
                match self.decoder.push(byte) {
                    None => {}
                    Some(DecodeEvent::Noise(byte)) => {
                        self.stats.noise_bytes += 1;
                        trace!(byte, "skipping noise byte");
                    }
                    Some(DecodeEvent::Decoded(message)) => {
                        let kind = message.kind();
                        debug!(%kind, "frame decoded");
                        if self.store.append(message).is_some() {
                            trace!(%kind, "store full, evicted oldest message");
                        }
                        self.stats.frames_decoded += 1;
                        return Ok(Step::Decoded(kind));
                    }
                    Some(DecodeEvent::Dropped(reason)) => {
                        self.record_drop(&reason);
                        return Ok(Step::Dropped(reason));
                    }
                }
            }
        }
    }

    fn pending(&self) -> Step {
        if self.decoder.is_idle() {
            Step::Idle
        } else {
            Step::Incomplete
        }
    }

    fn record_drop(&mut self, reason: &DropReason) {
        match reason {
            DropReason::UnknownType(code) => {
                self.stats.unknown_types += 1;
                warn!(code, "unknown frame type");
            }
            DropReason::ChecksumMismatch {
                kind,
                expected,
                received,
            } => {
                self.stats.checksum_failures += 1;
                warn!(%kind, expected, received, "checksum mismatch, frame dropped");
            }
            DropReason::InvalidPayload { kind, error } => {
                self.stats.invalid_payloads += 1;
                warn!(%kind, %error, "invalid payload, frame dropped");
            }
        }
    }

    /// The store that decoded messages land in.
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// A shared handle to the store, for consumers on other threads.
    pub fn store_handle(&self) -> Arc<MessageStore> {
        Arc::clone(&self.store)
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// Where the state machine currently is.
    pub fn state(&self) -> DecoderState {
        self.decoder.state()
    }

    /// Borrow the underlying port.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying port.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the receiver and return the inner port.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the high-water mark for subsequent steps.
    pub fn set_high_water_mark(&mut self, high_water_mark: usize) {
        self.config.high_water_mark = high_water_mark;
    }

    /// Current receiver configuration.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }
}

impl<T> std::fmt::Debug for FrameReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReceiver")
            .field("decoder", &self.decoder)
            .field("stats", &self.stats)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use serialcomm_transport::{MemoryPort, TransportError};

    use super::*;
    use crate::codec::{encode_frame, DEFAULT_HIGH_WATER_MARK, MAGIC};
    use crate::error::FrameError;
    use crate::payload::Message;

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for message in messages {
            encode_frame(message, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn receiver_with(bytes: &[u8]) -> FrameReceiver<MemoryPort> {
        let port = MemoryPort::new();
        port.inject(bytes);
        FrameReceiver::new(port)
    }

    #[test]
    fn timestamp_frame_lands_in_store() {
        let mut receiver = receiver_with(&[0x21, 0x32, 0x00, 0x00, 0x04, 0xD2, 0x2B]);

        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Timestamp));
        assert_eq!(
            receiver.store().snapshot(MessageKind::Timestamp),
            vec![Message::Timestamp(1234)]
        );
        assert_eq!(receiver.store().total_len(), 1);
        assert_eq!(receiver.step().unwrap(), Step::Idle);
    }

    #[test]
    fn only_the_frame_kind_is_mutated() {
        for message in [
            Message::Debug("d".to_string()),
            Message::PowerSetting(false),
            Message::MaxCurrent(30.0),
            Message::Voltage(3.3),
        ] {
            let kind = message.kind();
            let mut receiver = receiver_with(&wire(&[message.clone()]));
            receiver.process(10).unwrap();

            for other in MessageKind::ALL {
                let expected = if other == kind { 1 } else { 0 };
                assert_eq!(receiver.store().len(other), expected, "{kind} vs {other}");
            }
            assert_eq!(receiver.store().latest(kind), Some(message));
        }
    }

    #[test]
    fn corrupted_checksum_stores_nothing() {
        let mut bytes = wire(&[Message::Timestamp(1234)]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let mut receiver = receiver_with(&bytes);

        let step = receiver.step().unwrap();
        assert!(matches!(
            step,
            Step::Dropped(DropReason::ChecksumMismatch { .. })
        ));
        assert_eq!(receiver.store().total_len(), 0);
        assert_eq!(receiver.stats().checksum_failures, 1);
    }

    #[test]
    fn leading_noise_yields_same_single_value() {
        for k in [0usize, 1, 7, 200] {
            let mut bytes = vec![0x55; k];
            bytes.extend(wire(&[Message::RotSpeed(4200.0)]));
            let mut receiver = receiver_with(&bytes);

            let summary = receiver.process(1).unwrap();
            assert_eq!(summary.decoded, 1, "noise length {k}");
            assert_eq!(
                receiver.store().snapshot(MessageKind::RotSpeed),
                vec![Message::RotSpeed(4200.0)]
            );
            assert_eq!(receiver.stats().noise_bytes, k as u64);
        }
    }

    #[test]
    fn backlog_over_high_water_mark_is_discarded() {
        let frame = wire(&[Message::Timestamp(1)]);
        let mut bytes = Vec::new();
        while bytes.len() <= DEFAULT_HIGH_WATER_MARK {
            bytes.extend_from_slice(&frame);
        }
        let total = bytes.len();
        let mut receiver = receiver_with(&bytes);

        assert_eq!(receiver.step().unwrap(), Step::Flushed { bytes: total });
        assert_eq!(receiver.store().total_len(), 0);
        assert_eq!(receiver.get_ref().bytes_available().unwrap(), 0);
        assert_eq!(receiver.stats().overflow_flushes, 1);
        assert_eq!(receiver.stats().bytes_flushed, total as u64);
        assert_eq!(receiver.step().unwrap(), Step::Idle);
    }

    #[test]
    fn backlog_at_high_water_mark_is_processed() {
        let config = ReceiverConfig {
            high_water_mark: 7,
            ..ReceiverConfig::default()
        };
        let port = MemoryPort::new();
        port.inject(&wire(&[Message::Timestamp(1234)]));
        let mut receiver = FrameReceiver::with_config(port, config);

        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Timestamp));
    }

    #[test]
    fn flush_abandons_partial_frame() {
        let config = ReceiverConfig {
            high_water_mark: 16,
            ..ReceiverConfig::default()
        };
        let port = MemoryPort::new();
        let feeder = port.clone();
        let mut receiver = FrameReceiver::with_config(port, config);

        feeder.inject(&[MAGIC, MessageKind::Timestamp.code(), 0x00]);
        assert_eq!(receiver.step().unwrap(), Step::Incomplete);

        feeder.inject(&[0xEE; 32]);
        assert_eq!(receiver.step().unwrap(), Step::Flushed { bytes: 32 });
        assert_eq!(receiver.state(), DecoderState::Idle);

        feeder.inject(&wire(&[Message::Timestamp(9)]));
        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Timestamp));
        assert_eq!(
            receiver.store().latest(MessageKind::Timestamp),
            Some(Message::Timestamp(9))
        );
    }

    #[test]
    fn partial_frame_resumes_on_later_step() {
        let bytes = wire(&[Message::Error("overcurrent".to_string())]);
        let port = MemoryPort::new();
        let feeder = port.clone();
        let mut receiver = FrameReceiver::new(port);

        feeder.inject(&bytes[..5]);
        assert_eq!(receiver.step().unwrap(), Step::Incomplete);
        assert_eq!(
            receiver.state(),
            DecoderState::PayloadExpected(MessageKind::Error)
        );

        feeder.inject(&bytes[5..bytes.len() - 1]);
        assert_eq!(receiver.step().unwrap(), Step::Incomplete);
        assert_eq!(
            receiver.state(),
            DecoderState::ChecksumExpected(MessageKind::Error)
        );

        feeder.inject(&bytes[bytes.len() - 1..]);
        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Error));
        assert_eq!(
            receiver.store().drain(MessageKind::Error),
            vec![Message::Error("overcurrent".to_string())]
        );
    }

    #[test]
    fn short_reads_are_handled() {
        let messages = vec![
            Message::Debug("a longer debug line that spans many reads".to_string()),
            Message::Current(1.5),
        ];
        let port = MemoryPort::new().with_read_limit(1);
        port.inject(&wire(&messages));
        let mut receiver = FrameReceiver::new(port);

        let summary = receiver.process(10).unwrap();
        assert_eq!(summary.decoded, 2);
        assert_eq!(
            receiver.store().snapshot(MessageKind::Debug),
            vec![messages[0].clone()]
        );
        assert_eq!(
            receiver.store().snapshot(MessageKind::Current),
            vec![messages[1].clone()]
        );
    }

    #[test]
    fn long_text_crosses_read_chunks() {
        let text = "z".repeat(900);
        let mut receiver = receiver_with(&wire(&[Message::Debug(text.clone())]));
        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Debug));
        assert_eq!(
            receiver.store().latest(MessageKind::Debug),
            Some(Message::Debug(text))
        );
    }

    #[test]
    fn each_step_completes_at_most_one_frame() {
        let bytes = wire(&[
            Message::Timestamp(1),
            Message::Timestamp(2),
            Message::Timestamp(3),
        ]);
        let mut receiver = receiver_with(&bytes);

        let summary = receiver.process(2).unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.decoded, 2);
        assert_eq!(receiver.store().len(MessageKind::Timestamp), 2);

        let summary = receiver.process(10).unwrap();
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.steps, 2);
    }

    #[test]
    fn unknown_type_is_counted_and_scanning_resumes() {
        let mut bytes = vec![MAGIC, 0x50];
        bytes.extend(wire(&[Message::Thrust(2.0)]));
        let mut receiver = receiver_with(&bytes);

        assert_eq!(
            receiver.step().unwrap(),
            Step::Dropped(DropReason::UnknownType(0x50))
        );
        assert_eq!(receiver.step().unwrap(), Step::Decoded(MessageKind::Thrust));
        assert_eq!(receiver.stats().unknown_types, 1);
        assert_eq!(receiver.stats().frames_dropped(), 1);
    }

    #[test]
    fn store_capacity_comes_from_config() {
        let config = ReceiverConfig {
            store_capacity: 2,
            ..ReceiverConfig::default()
        };
        let port = MemoryPort::new();
        port.inject(&wire(&[
            Message::Voltage(1.0),
            Message::Voltage(2.0),
            Message::Voltage(3.0),
        ]));
        let mut receiver = FrameReceiver::with_config(port, config);
        receiver.process(10).unwrap();

        assert_eq!(receiver.store().capacity(), 2);
        assert_eq!(
            receiver.store().snapshot(MessageKind::Voltage),
            vec![Message::Voltage(2.0), Message::Voltage(3.0)]
        );
    }

    #[test]
    fn transport_error_propagates_and_resets_frame() {
        let port = MemoryPort::new();
        let handle = port.clone();
        let mut receiver = FrameReceiver::new(port);

        handle.inject(&[MAGIC, MessageKind::Current.code(), 0x00]);
        assert_eq!(receiver.step().unwrap(), Step::Incomplete);

        handle.disconnect();
        let err = receiver.step().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Disconnected)
        ));
        assert_eq!(receiver.state(), DecoderState::Idle);
    }

    #[test]
    fn store_handle_is_shared_with_consumers() {
        let port = MemoryPort::new();
        let feeder = port.clone();
        let mut receiver = FrameReceiver::new(port);
        let store = receiver.store_handle();

        let consumer = std::thread::spawn(move || {
            let mut seen = Vec::new();
            while seen.len() < 3 {
                seen.extend(store.drain(MessageKind::Timestamp));
                std::thread::yield_now();
            }
            seen
        });

        for i in 0..3 {
            feeder.inject(&wire(&[Message::Timestamp(i)]));
            receiver.process(4).unwrap();
        }

        let seen = consumer.join().unwrap();
        assert_eq!(
            seen,
            vec![
                Message::Timestamp(0),
                Message::Timestamp(1),
                Message::Timestamp(2)
            ]
        );
    }

    #[test]
    fn set_high_water_mark_applies_to_next_step() {
        let mut receiver = receiver_with(&[0x00; 64]);
        receiver.set_high_water_mark(10);
        assert_eq!(receiver.config().high_water_mark, 10);
        assert_eq!(receiver.step().unwrap(), Step::Flushed { bytes: 64 });
    }

    #[test]
    fn accessors_and_into_inner() {
        let line = MemoryPort::new();
        let mut receiver = FrameReceiver::new(line.clone());
        line.inject(&[0x21, 0x32, 0x00, 0x00, 0x00, 0x05, 0xFC]);
        assert_eq!(receiver.get_ref().bytes_available().unwrap(), 7);

        receiver.get_mut().discard_input().unwrap();
        assert_eq!(receiver.get_ref().bytes_available().unwrap(), 0);
        assert_eq!(receiver.step().unwrap(), Step::Idle);

        let mut port = receiver.into_inner();
        line.inject(b"xy");
        assert_eq!(port.bytes_available().unwrap(), 2);
        let mut buf = [0u8; 2];
        assert_eq!(port.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"xy");
    }
}

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::codec::encode_frame;
use crate::decoder::{DecodeEvent, FrameDecoder};
use crate::error::{FrameError, Result};
use crate::payload::Message;

/// Frame codec implementing [`tokio_util::codec::Decoder`] and [`Encoder`].
///
/// Decoding yields only messages that passed their checksum. Dropped frames
/// are logged and counted, the stream keeps going.
#[derive(Debug, Default)]
pub struct FrameCodec {
    decoder: FrameDecoder,
    dropped: u64,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames discarded so far for unknown tags, bad checksums or invalid
    /// payloads.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&item, dst)
    }
}

impl Encoder<&Message> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<()> {
        encode_frame(item, dst)
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        while let Some(event) = self.decoder.decode(src) {
            match event {
                DecodeEvent::Decoded(message) => return Ok(Some(message)),
                DecodeEvent::Dropped(reason) => {
                    self.dropped += 1;
                    warn!(?reason, "frame dropped");
                }
                DecodeEvent::Noise(_) => {}
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        if !self.decoder.is_idle() {
            debug!(state = ?self.decoder.state(), "stream ended inside a frame");
            self.decoder.reset();
        }
        Ok(None)
    }
}

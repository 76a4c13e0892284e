use bytes::BytesMut;
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use message::Packet;

use crate::{
    Error,
    FrameCodec,
};

/// Typed packets over a byte stream: [`FrameCodec`] framing plus the packet wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketCodec {
    frames: FrameCodec,
}

impl PacketCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for PacketCodec {
    type Error = Error;
    type Item = Packet;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let packet = match self.frames.decode(src)? {
            Some(frame) => Packet::decode(&frame)?,
            None => return Ok(None),
        };

        Ok(Some(packet))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let packet = match self.frames.decode_eof(buf)? {
            Some(frame) => Packet::decode(&frame)?,
            None => return Ok(None),
        };

        Ok(Some(packet))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = Error;

    #[tracing::instrument(level = "trace", skip_all, fields(packet = %item))]
    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.frames.encode(item.encode(), dst)
    }
}

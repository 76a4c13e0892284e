use bytes::{
    Buf,
    BufMut,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use message::{
    Command,
    HEADER,
    LOC_COMMAND,
    LOC_HEADER,
    PACKET_LEN,
};

use crate::Error;

/// Carves fixed-length frames out of a byte stream.
///
/// A frame starts at a header byte followed by a known command byte. Anything else in front of a
/// frame is dropped a byte at a time until the stream lines up again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCodec {
    skipped: usize,
}

impl FrameCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn skip(&mut self, src: &mut BytesMut, n: usize) {
        src.advance(n);
        self.skipped += n;
    }

    fn report_skipped(&mut self) {
        if self.skipped > 0 {
            tracing::warn!(bytes = self.skipped, "discarded bytes while resynchronizing");
            self.skipped = 0;
        }
    }
}

impl Decoder for FrameCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match src.iter().position(|&b| b == HEADER) {
                Some(0) => {},
                Some(n) => self.skip(src, n),
                None => {
                    let n = src.len();
                    self.skip(src, n);

                    return Ok(None);
                },
            }

            if src.len() <= LOC_COMMAND {
                return Ok(None);
            }

            if Command::from_code(src[LOC_COMMAND]).is_none() {
                tracing::debug!(
                    command = src[LOC_COMMAND],
                    "header followed by unknown command, treating as noise"
                );
                self.skip(src, 1);
                continue;
            }

            if src.len() < PACKET_LEN {
                src.reserve(PACKET_LEN - src.len());
                return Ok(None);
            }

            self.report_skipped();

            let frame = src.split_to(PACKET_LEN).freeze();
            tracing::trace!(frame = %hex::encode(&frame), "read frame");

            return Ok(Some(frame));
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        if !buf.is_empty() {
            tracing::warn!(len = buf.len(), "dropping partial frame at end of stream");
            buf.clear();
        }

        self.report_skipped();

        Ok(None)
    }
}

impl<T> Encoder<T> for FrameCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let item = item.as_ref();

        if item.len() != PACKET_LEN {
            return Err(message::Error::MalformedPacket {
                len: item.len(),
            }
            .into());
        }

        if item[LOC_HEADER] != HEADER {
            return Err(message::Error::BadHeader(item[LOC_HEADER]).into());
        }

        dst.reserve(PACKET_LEN);
        dst.put(item);

        Ok(())
    }
}

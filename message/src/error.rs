use crate::PACKET_LEN;

/// Failures of the packet codec.
///
/// Decode errors are recoverable: the receiver drops the buffer and resynchronizes on the stream.
/// `InvalidCommand` is only produced on the encode side and indicates a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    #[error("malformed packet: expected {} bytes, got {len}", PACKET_LEN)]
    MalformedPacket { len: usize },

    #[error("bad header byte: 0x{0:02x}")]
    BadHeader(u8),

    #[error("unknown command code: 0x{0:02x}")]
    UnknownCommand(u8),

    #[error("invalid command for encode: 0x{0:02x}")]
    InvalidCommand(u8),
}

//! Wire format for the tracker's serial protocol.
//!
//! Every packet is exactly [`PACKET_LEN`] bytes:
//!
//! ```text
//! [0xAA] [command] [args: 22 bytes, zero-padded]
//! ```
//!
//! 8-byte fields are IEEE-754 doubles in big-endian (network) byte order; both ends of the link
//! must agree on this. There is no checksum.

mod command;
mod error;
mod packet;

pub use command::Command;
pub use error::Error;
pub use packet::{
    Arguments,
    Environment,
    Orientation,
    Packet,
    Position,
};

pub const PACKET_LEN: usize = 24;
pub const HEADER: u8 = 0xaa;

pub const LOC_HEADER: usize = 0;
pub const LOC_COMMAND: usize = 1;
pub const LOC_ARGS: usize = 2;

pub const ARGS_LEN: usize = PACKET_LEN - LOC_ARGS;
pub const FIELD_LEN: usize = std::mem::size_of::<f64>();

// offsets within the argument region
pub const LOC_ACKD_COMMAND: usize = 0;
pub const LOC_AZIMUTH: usize = 0;
pub const LOC_ELEVATION: usize = LOC_AZIMUTH + FIELD_LEN;
pub const LOC_TEMP: usize = 0;
pub const LOC_HUMID: usize = LOC_TEMP + FIELD_LEN;
pub const LOC_LAT: usize = 0;
pub const LOC_LONG: usize = LOC_LAT + FIELD_LEN;

pub type Frame = [u8; PACKET_LEN];

/// Encode a packet from a raw command code.
#[inline]
pub fn encode(code: u8, args: Arguments) -> Result<Frame, Error> {
    Packet::from_parts(code, args).map(|p| p.encode())
}

#[inline]
pub fn decode(src: &[u8]) -> Result<Packet, Error> {
    Packet::decode(src)
}

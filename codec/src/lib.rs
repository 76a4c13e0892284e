pub use ::tokio_util::codec as tokio_codec;

mod frame;
mod packet;

pub use self::{
    frame::FrameCodec,
    packet::PacketCodec,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Packet(#[from] message::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

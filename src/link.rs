use tokio::io::{
    ReadHalf,
    WriteHalf,
};
use tokio_serial::{
    DataBits,
    Parity,
    SerialStream,
    StopBits,
};
use tokio_util::codec::{
    FramedRead,
    FramedWrite,
};

use codec::PacketCodec;

use crate::{
    options::SerialOptions,
    session::{
        self,
        Session,
    },
};

pub type PacketReader = FramedRead<ReadHalf<SerialStream>, PacketCodec>;
pub type PacketWriter = FramedWrite<WriteHalf<SerialStream>, PacketCodec>;

pub type SerialSession = Session<PacketReader, PacketWriter>;

/// Open the port 8N1 at the configured baud rate and frame it into packets.
///
/// Must be called from within a tokio runtime.
#[tracing::instrument(fields(port = %opts.port, baud = opts.baud), skip(opts), err(Display))]
pub fn open_framed(opts: &SerialOptions) -> Result<(PacketReader, PacketWriter), tokio_serial::Error> {
    let builder = tokio_serial::new(&opts.port, opts.baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One);

    let stream = SerialStream::open(&builder)?;

    tracing::info!("opened serial port");

    let (reader, writer) = tokio::io::split(stream);

    Ok((FramedRead::new(reader, PacketCodec::new()), FramedWrite::new(writer, PacketCodec::new())))
}

pub fn open(
    opts: &SerialOptions,
    config: session::Config,
) -> Result<SerialSession, tokio_serial::Error> {
    let (reader, writer) = open_framed(opts)?;

    Ok(Session::new(reader, writer, config))
}

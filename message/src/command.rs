use std::fmt::{
    Display,
    Formatter,
};

use packed_struct::prelude::*;

/// Command byte of a packet. Selects how the argument region is laid out.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PrimitiveEnum_u8, serde::Serialize, serde::Deserialize,
)]
#[repr(u8)]
pub enum Command {
    Ack                 = 0x01,
    Nack                = 0x02,
    OrientationSet      = 0x03,
    OrientationRead     = 0x04,
    OrientationResponse = 0x05,
    EnvRead             = 0x06,
    EnvResponse         = 0x07,
    GpsRead             = 0x08,
    GpsResponse         = 0x09,
    EstablishConnection = 0x0a,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::Ack,
        Command::Nack,
        Command::OrientationSet,
        Command::OrientationRead,
        Command::OrientationResponse,
        Command::EnvRead,
        Command::EnvResponse,
        Command::GpsRead,
        Command::GpsResponse,
        Command::EstablishConnection,
    ];

    #[inline]
    pub fn code(self) -> u8 {
        self.to_primitive()
    }

    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::from_primitive(code)
    }

    /// Number of argument bytes this command actually uses.
    pub fn args_len(self) -> usize {
        match self {
            Command::Ack | Command::Nack => 1,

            Command::OrientationSet
            | Command::OrientationResponse
            | Command::EnvResponse
            | Command::GpsResponse => 2 * crate::FIELD_LEN,

            Command::OrientationRead
            | Command::EnvRead
            | Command::GpsRead
            | Command::EstablishConnection => 0,
        }
    }

    /// The reply the device is expected to send for this command. `None` for ACK and NACK, which
    /// are never answered.
    pub fn response(self) -> Option<Command> {
        match self {
            Command::Ack | Command::Nack => None,

            Command::OrientationRead => Some(Command::OrientationResponse),
            Command::EnvRead => Some(Command::EnvResponse),
            Command::GpsRead => Some(Command::GpsResponse),

            Command::OrientationSet
            | Command::OrientationResponse
            | Command::EnvResponse
            | Command::GpsResponse
            | Command::EstablishConnection => Some(Command::Ack),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} (0x{:02x})", self, self.code())
    }
}

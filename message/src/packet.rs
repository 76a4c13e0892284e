use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    Buf,
    BufMut,
};

use crate::{
    Command,
    Error,
    Frame,
    HEADER,
    LOC_ARGS,
    LOC_COMMAND,
    LOC_HEADER,
    PACKET_LEN,
};

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Orientation {
    pub azimuth:   f64,
    pub elevation: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Environment {
    pub temperature: f64,
    pub humidity:    f64,
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub latitude:  f64,
    pub longitude: f64,
}

macro_rules! pair_fields {
    ($ty:ident, $a:ident, $b:ident) => {
        impl $ty {
            #[inline]
            pub fn new($a: f64, $b: f64) -> Self {
                Self {
                    $a,
                    $b,
                }
            }

            #[inline]
            fn pair(&self) -> (f64, f64) {
                (self.$a, self.$b)
            }
        }

        impl From<(f64, f64)> for $ty {
            #[inline]
            fn from(($a, $b): (f64, f64)) -> Self {
                Self::new($a, $b)
            }
        }
    };
}

pair_fields!(Orientation, azimuth, elevation);
pair_fields!(Environment, temperature, humidity);
pair_fields!(Position, latitude, longitude);

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Azimuth: {} degrees, Elevation: {} degrees", self.azimuth, self.elevation)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Temperature: {} degrees C, Humidity: {} %", self.temperature, self.humidity)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Latitude: {} degrees, Longitude: {} degrees", self.latitude, self.longitude)
    }
}

/// Untyped view of a packet's argument region.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Arguments {
    None,
    /// A single byte, the acknowledged or rejected command code.
    Code(u8),
    /// Two consecutive 8-byte doubles.
    Pair(f64, f64),
}

/// A decoded packet. One variant per command, each carrying that command's fields.
///
/// ACK and NACK carry the raw code they refer to: the device may acknowledge a code this host
/// doesn't know, and decoding must not fail because of it.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Packet {
    Ack { code: u8 },
    Nack { code: u8 },
    OrientationSet(Orientation),
    OrientationRead,
    OrientationResponse(Orientation),
    EnvRead,
    EnvResponse(Environment),
    GpsRead,
    GpsResponse(Position),
    EstablishConnection,
}

impl Packet {
    #[inline]
    pub fn ack(command: Command) -> Self {
        Packet::Ack {
            code: command.code(),
        }
    }

    #[inline]
    pub fn nack(command: Command) -> Self {
        Packet::Nack {
            code: command.code(),
        }
    }

    pub fn command(&self) -> Command {
        match self {
            Packet::Ack {
                ..
            } => Command::Ack,
            Packet::Nack {
                ..
            } => Command::Nack,
            Packet::OrientationSet(_) => Command::OrientationSet,
            Packet::OrientationRead => Command::OrientationRead,
            Packet::OrientationResponse(_) => Command::OrientationResponse,
            Packet::EnvRead => Command::EnvRead,
            Packet::EnvResponse(_) => Command::EnvResponse,
            Packet::GpsRead => Command::GpsRead,
            Packet::GpsResponse(_) => Command::GpsResponse,
            Packet::EstablishConnection => Command::EstablishConnection,
        }
    }

    pub fn arguments(&self) -> Arguments {
        match self {
            Packet::Ack {
                code,
            }
            | Packet::Nack {
                code,
            } => Arguments::Code(*code),

            Packet::OrientationSet(o) | Packet::OrientationResponse(o) => {
                let (a, b) = o.pair();
                Arguments::Pair(a, b)
            },
            Packet::EnvResponse(env) => {
                let (a, b) = env.pair();
                Arguments::Pair(a, b)
            },
            Packet::GpsResponse(pos) => {
                let (a, b) = pos.pair();
                Arguments::Pair(a, b)
            },

            Packet::OrientationRead
            | Packet::EnvRead
            | Packet::GpsRead
            | Packet::EstablishConnection => Arguments::None,
        }
    }

    /// Build a packet from a raw command code and its arguments. Fails with `InvalidCommand` if
    /// the code is unknown or the arguments don't match the command's layout.
    pub fn from_parts(code: u8, args: Arguments) -> Result<Self, Error> {
        let command = Command::from_code(code).ok_or(Error::InvalidCommand(code))?;

        let packet = match (command, args) {
            (Command::Ack, Arguments::Code(code)) => Packet::Ack {
                code,
            },
            (Command::Nack, Arguments::Code(code)) => Packet::Nack {
                code,
            },

            (Command::OrientationSet, Arguments::Pair(a, b)) => Packet::OrientationSet((a, b).into()),
            (Command::OrientationResponse, Arguments::Pair(a, b)) => {
                Packet::OrientationResponse((a, b).into())
            },
            (Command::EnvResponse, Arguments::Pair(a, b)) => Packet::EnvResponse((a, b).into()),
            (Command::GpsResponse, Arguments::Pair(a, b)) => Packet::GpsResponse((a, b).into()),

            (Command::OrientationRead, Arguments::None) => Packet::OrientationRead,
            (Command::EnvRead, Arguments::None) => Packet::EnvRead,
            (Command::GpsRead, Arguments::None) => Packet::GpsRead,
            (Command::EstablishConnection, Arguments::None) => Packet::EstablishConnection,

            _ => return Err(Error::InvalidCommand(code)),
        };

        Ok(packet)
    }

    /// Serialize to the wire. Fields are written big-endian in layout order; unused argument
    /// bytes are zero.
    pub fn encode(&self) -> Frame {
        let mut frame = [0u8; PACKET_LEN];

        frame[LOC_HEADER] = HEADER;
        frame[LOC_COMMAND] = self.command().code();

        let mut args = &mut frame[LOC_ARGS..];
        match self.arguments() {
            Arguments::None => {},
            Arguments::Code(code) => args.put_u8(code),
            Arguments::Pair(a, b) => {
                args.put_f64(a);
                args.put_f64(b);
            },
        }

        frame
    }

    pub fn decode(src: &[u8]) -> Result<Self, Error> {
        if src.len() != PACKET_LEN {
            return Err(Error::MalformedPacket {
                len: src.len(),
            });
        }

        if src[LOC_HEADER] != HEADER {
            return Err(Error::BadHeader(src[LOC_HEADER]));
        }

        let code = src[LOC_COMMAND];
        let command = Command::from_code(code).ok_or(Error::UnknownCommand(code))?;

        let mut args = &src[LOC_ARGS..];
        let arguments = match command.args_len() {
            0 => Arguments::None,
            1 => Arguments::Code(args.get_u8()),
            _ => {
                let a = args.get_f64();
                let b = args.get_f64();

                Arguments::Pair(a, b)
            },
        };

        let packet = Self::from_parts(code, arguments)?;
        tracing::trace!(%packet, "decoded packet");

        Ok(packet)
    }

    #[inline]
    pub fn hex(&self) -> String {
        hex::encode(self.encode())
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = Error;

    #[inline]
    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        Packet::decode(src)
    }
}

impl From<Packet> for Frame {
    #[inline]
    fn from(packet: Packet) -> Self {
        packet.encode()
    }
}

fn fmt_code(f: &mut Formatter<'_>, code: u8) -> std::fmt::Result {
    match Command::from_code(code) {
        Some(cmd) => write!(f, "{cmd}"),
        None => write!(f, "<unknown> (0x{code:02x})"),
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())?;

        match self {
            Packet::Ack {
                code,
            } => {
                f.write_str(" / Ack'd Command: ")?;
                fmt_code(f, *code)
            },
            Packet::Nack {
                code,
            } => {
                f.write_str(" / Nack'd Command: ")?;
                fmt_code(f, *code)
            },
            Packet::OrientationSet(o) | Packet::OrientationResponse(o) => write!(f, " / {o}"),
            Packet::EnvResponse(env) => write!(f, " / {env}"),
            Packet::GpsResponse(pos) => write!(f, " / {pos}"),
            Packet::OrientationRead
            | Packet::EnvRead
            | Packet::GpsRead
            | Packet::EstablishConnection => Ok(()),
        }
    }
}

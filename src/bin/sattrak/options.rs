use std::path::PathBuf;

use structopt::clap::AppSettings;

use sattrak::options::{
    SerialOptions,
    SessionOptions,
};

#[derive(Debug, Clone, PartialEq, structopt::StructOpt)]
#[structopt(name = "sattrak", about = "Host controller for the satellite tracker.")]
pub struct Options {
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Link {
    #[structopt(flatten)]
    pub serial: SerialOptions,

    #[structopt(flatten)]
    pub session: SessionOptions,

    /// Talk to the device without handshaking first.
    #[structopt(long)]
    pub no_handshake: bool,
}

#[derive(Debug, Clone, PartialEq, structopt::StructOpt)]
pub enum Command {
    /// Handshake with the device and exit.
    Connect(Link),

    /// Read the current azimuth and elevation.
    Orientation(Link),

    /// Read temperature and humidity.
    Environment(Link),

    /// Read the GPS fix.
    Gps(Link),

    /// Point the tracker.
    #[structopt(setting = AppSettings::AllowNegativeNumbers)]
    Point {
        #[structopt(flatten)]
        link: Link,

        azimuth: f64,

        elevation: f64,
    },

    /// Run a JSON task schedule.
    Track {
        #[structopt(flatten)]
        link: Link,

        tasks: PathBuf,

        /// How far ahead of each task to move the motors.
        #[structopt(long, default_value = "5000")]
        lead_ms: u64,
    },

    /// Decode a hex-encoded packet.
    Decode {
        hex: String,

        #[structopt(long)]
        json: bool,
    },

    /// Encode a packet from a command code and its arguments: none, one ack'd code, or two
    /// numbers.
    #[structopt(setting = AppSettings::AllowNegativeNumbers)]
    Encode {
        #[structopt(parse(try_from_str = parse_code))]
        code: u8,

        args: Vec<String>,
    },
}

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_code(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

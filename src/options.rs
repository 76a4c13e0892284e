use std::time::Duration;

use crate::session;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct SerialOptions {
    #[structopt(short, long)]
    pub port: String,

    #[structopt(short, long, default_value = "9600")]
    pub baud: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct SessionOptions {
    /// Milliseconds to wait for the device to answer a command.
    #[structopt(long, default_value = "2000")]
    pub timeout_ms: u64,

    /// Milliseconds to wait after opening the port before the first handshake attempt. Opening
    /// the port resets the microcontroller.
    #[structopt(long, default_value = "2000")]
    pub settle_ms: u64,

    #[structopt(long, default_value = "5")]
    pub handshake_attempts: usize,

    #[structopt(long, default_value = "2000")]
    pub retry_delay_ms: u64,
}

impl From<&SessionOptions> for session::Config {
    fn from(opts: &SessionOptions) -> Self {
        session::Config {
            response_timeout:   Duration::from_millis(opts.timeout_ms),
            settle:             Duration::from_millis(opts.settle_ms),
            handshake_attempts: opts.handshake_attempts,
            retry_delay:        Duration::from_millis(opts.retry_delay_ms),
        }
    }
}

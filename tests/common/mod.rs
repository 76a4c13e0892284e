#![allow(dead_code)]

use std::{
    str::FromStr,
    time::Duration,
};

use tokio::{
    io::{
        DuplexStream,
        ReadHalf,
        WriteHalf,
    },
    task::JoinHandle,
};
use tokio_util::codec::{
    FramedRead,
    FramedWrite,
};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    EnvFilter,
};

use codec::PacketCodec;
use sattrak::{
    device::{
        self,
        Device,
    },
    session::{
        self,
        Session,
    },
};

pub type HostSession = Session<
    FramedRead<ReadHalf<DuplexStream>, PacketCodec>,
    FramedWrite<WriteHalf<DuplexStream>, PacketCodec>,
>;

pub fn trace_init() {
    let level_filter = EnvFilter::from_str("debug").unwrap();

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .pretty()
        .try_init();
}

pub fn quick_config() -> session::Config {
    session::Config {
        response_timeout:   Duration::from_millis(200),
        settle:             Duration::from_millis(10),
        handshake_attempts: 3,
        retry_delay:        Duration::from_millis(10),
    }
}

fn session_over(stream: DuplexStream, config: session::Config) -> HostSession {
    let (r, w) = tokio::io::split(stream);

    Session::new(FramedRead::new(r, PacketCodec::new()), FramedWrite::new(w, PacketCodec::new()), config)
}

pub struct Harness {
    pub session: HostSession,
    pub device:  JoinHandle<Result<Device, codec::Error>>,
}

impl Harness {
    /// A session wired to a simulated device running on its own task.
    pub fn new(device: Device, config: session::Config) -> Self {
        let (host, remote) = tokio::io::duplex(4096);

        let device = tokio::spawn(async move {
            let mut device = device;
            let (r, w) = tokio::io::split(remote);

            device::serve(
                &mut device,
                FramedRead::new(r, PacketCodec::new()),
                FramedWrite::new(w, PacketCodec::new()),
            )
            .await?;

            Ok(device) as Result<Device, codec::Error>
        });

        Harness {
            session: session_over(host, config),
            device,
        }
    }

    /// Close the link and collect the device's final state.
    pub async fn finish(self) -> eyre::Result<Device> {
        drop(self.session);
        Ok(self.device.await??)
    }
}

/// A session whose far end never answers. The returned stream must be kept alive.
pub fn silent(config: session::Config) -> (HostSession, DuplexStream) {
    let (host, remote) = tokio::io::duplex(4096);
    (session_over(host, config), remote)
}

use std::ffi::OsString;

use async_compat::CompatExt;
use rustyline_async::ReadlineError;
use structopt::StructOpt;
use tokio::io::{
    AsyncWrite,
    AsyncWriteExt,
};

use message::Packet;
use sattrak::{
    link::{
        self,
        SerialSession,
    },
    session,
    trace,
};

mod options;

pub use options::Options;

#[derive(structopt::StructOpt)]
#[structopt(setting = structopt::clap::AppSettings::NoBinaryName)]
#[structopt(setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
enum Command {
    Connect,
    Orientation,
    Environment,
    Gps,

    Point {
        azimuth:   f64,
        elevation: f64,
    },

    /// Send a hex-encoded packet, waiting for a reply if its command has one.
    Literal {
        #[structopt(required = true)]
        value: String,
    },

    /// Wait for the next packet from the device.
    Recv,

    /// Drop everything the device has sent so far.
    Drain,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts: Options = Options::from_args();

    trace::init();

    let session = link::open(&opts.serial, session::Config::from(&opts.session))?;

    if !opts.no_handshake {
        session.establish_connection().await?;
    }

    let (mut rl, w) = rustyline_async::Readline::new("> ".to_owned())?;
    let mut w = w.compat();

    loop {
        w.flush().await?;

        let line = match rl.readline().await {
            Ok(line) => line,

            Err(ReadlineError::Closed)
            | Err(ReadlineError::Eof)
            | Err(ReadlineError::Interrupted) => return Ok(()),

            e @ Err(ReadlineError::IO(_)) => e?,
        };

        let words = match shlex::split(&line) {
            Some(x) => x,
            None => {
                w.write_all(b"failed to split line\n").await?;
                continue;
            },
        };

        if words.is_empty() {
            continue;
        }

        let command = match Command::from_iter_safe(words.into_iter().map(OsString::from)) {
            Ok(c) => c,
            Err(e) => {
                w.write_all(format!("command error: {e}\n").as_bytes()).await?;
                continue;
            },
        };

        if let Err(e) = run(&session, command, &mut w).await {
            w.write_all(format!("error: {e}\n").as_bytes()).await?;
        }
    }
}

async fn run(
    session: &SerialSession,
    command: Command,
    mut output: impl AsyncWrite + Unpin,
) -> eyre::Result<()> {
    let text = match command {
        Command::Connect => {
            session.establish_connection().await?;
            "connected".to_owned()
        },

        Command::Orientation => session.orientation().await?.to_string(),
        Command::Environment => session.environment().await?.to_string(),
        Command::Gps => session.position().await?.to_string(),

        Command::Point {
            azimuth,
            elevation,
        } => {
            session.point((azimuth, elevation).into()).await?;
            "ok".to_owned()
        },

        Command::Literal {
            value,
        } => {
            let packet = Packet::decode(&hex::decode(value)?)?;

            if packet.command().response().is_some() {
                session.request(packet).await?.to_string()
            } else {
                session.send(packet).await?;
                format!("sent {packet}")
            }
        },

        Command::Recv => {
            let packet = session.recv().await?;
            format!("{}\n\t{packet}", packet.hex())
        },

        Command::Drain => format!("dropped {} packets", session.drain().await),
    };

    output.write_all(format!("{text}\n").as_bytes()).await?;

    Ok(())
}

use std::time::Duration;

use structopt::StructOpt;

use message::{
    Arguments,
    Packet,
};
use sattrak::{
    build,
    link,
    schedule::{
        self,
        Schedule,
    },
    session,
    trace,
};

mod options;

pub use options::{
    Command,
    Link,
    Options,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    sattrak::bootstrap!(
        "starting {} {} (built at {} with rustc {})",
        build::PACKAGE,
        build::VERSION,
        build::BUILD_TIMESTAMP,
        build::RUSTC_COMMIT_HASH,
    );

    let opts = Options::from_args();

    trace::init();

    match opts.command {
        Command::Connect(link) => {
            connect(&link).await?;
            println!("connected");
        },

        Command::Orientation(link) => println!("{}", connect(&link).await?.orientation().await?),
        Command::Environment(link) => println!("{}", connect(&link).await?.environment().await?),
        Command::Gps(link) => println!("{}", connect(&link).await?.position().await?),

        Command::Point {
            link,
            azimuth,
            elevation,
        } => {
            let session = connect(&link).await?;
            session.point((azimuth, elevation).into()).await?;
            println!("{}", session.orientation().await?);
        },

        Command::Track {
            link,
            tasks,
            lead_ms,
        } => {
            let schedule = Schedule::load(&tasks).await?;
            tracing::info!(tasks = schedule.len(), path = %tasks.display(), "loaded schedule");

            let session = connect(&link).await?;
            let summary = schedule::run(&session, schedule, Duration::from_millis(lead_ms)).await;

            println!("{} completed, {} failed", summary.completed, summary.failed);
        },

        Command::Decode {
            hex,
            json,
        } => {
            let bytes = hex::decode(hex.replace(char::is_whitespace, ""))?;
            let packet = message::decode(&bytes)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&packet)?);
            } else {
                println!("{packet}");
            }
        },

        Command::Encode {
            code,
            args,
        } => {
            let args = match &args[..] {
                [] => Arguments::None,
                [ackd] => Arguments::Code(options::parse_code(ackd)?),
                [a, b] => Arguments::Pair(a.parse()?, b.parse()?),
                _ => eyre::bail!("expected at most two arguments, got {}", args.len()),
            };

            let packet = Packet::from_parts(code, args)?;
            println!("{}", packet.hex());
        },
    }

    Ok(())
}

async fn connect(link: &Link) -> eyre::Result<link::SerialSession> {
    let session = link::open(&link.serial, session::Config::from(&link.session))?;

    if !link.no_handshake {
        session.establish_connection().await?;
    }

    Ok(session)
}

use structopt::StructOpt;

use message::{
    Environment,
    Position,
};
use sattrak::{
    device::{
        self,
        Device,
    },
    link,
    trace,
};

mod options;

pub use options::Options;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts: Options = Options::from_args();

    trace::init();

    let mut device = Device {
        environment: Environment::new(opts.temperature, opts.humidity),
        position: Position::new(opts.latitude, opts.longitude),
        ..Default::default()
    };

    let (reader, writer) = link::open_framed(&opts.serial)?;

    tokio::select! {
        result = device::serve(&mut device, reader, writer) => result?,

        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupted");
        },
    }

    tracing::info!(orientation = %device.orientation, "final state");

    Ok(())
}

use sattrak::options::{
    SerialOptions,
    SessionOptions,
};

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
#[structopt(name = "console", about = "Interactive console for the satellite tracker.")]
pub struct Options {
    #[structopt(flatten)]
    pub serial: SerialOptions,

    #[structopt(flatten)]
    pub session: SessionOptions,

    /// Skip the handshake on startup. `connect` can still be issued by hand.
    #[structopt(long)]
    pub no_handshake: bool,
}

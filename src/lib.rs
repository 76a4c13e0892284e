pub mod device;
pub mod link;
pub mod options;
pub mod schedule;
pub mod session;
pub mod trace;

pub use ::util::{
    bootstrap,
    build,
    trace_catch,
};

pub use session::Session;

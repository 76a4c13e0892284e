use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    prelude::*,
    EnvFilter,
};

use crate::{
    bootstrap,
    build,
};

/// Install the global subscriber. Logs go to stderr so stdout stays clean for command output.
pub fn init() {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let level_filter = mk_level_filter();
    bootstrap!("enabling tracing with filter directive: {}", level_filter);

    cfg_if::cfg_if! {
        if #[cfg(debug_assertions)] {
            tracing_subscriber::registry().with(level_filter).with(stderr_layer.pretty()).init();
        } else {
            tracing_subscriber::registry().with(level_filter).with(stderr_layer.json()).init();
        }
    }

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );
}

fn mk_level_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_str = {
            cfg_if::cfg_if! {
                if #[cfg(not(debug_assertions))] {
                    "warn,sattrak=info,console=info,mockdevice=info"
                } else {
                    "info,sattrak=debug,console=debug,mockdevice=debug"
                }
            }
        };

        EnvFilter::from_str(default_str).expect("parsing envfilter default string")
    })
}

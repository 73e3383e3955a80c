//! Tracing setup.
//!
//! Logs go to stderr; stdout is reserved for the waiting/progress status
//! lines, which are overwritten in place with `\r`.

use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise uses the CLI log level. Noisy
/// debug output from russh internals is silenced so that `--log-level debug`
/// shows application logs without drowning in transport-layer chatter.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level))
        .add_directive("russh=warn".parse().unwrap())
        .add_directive("russh_keys=warn".parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

//! Logger setup.
//!
//! The crate itself only emits through the `log` facade. Binaries and tests
//! that want to see the output call [`init`] once; later calls are ignored.

use log::info;

/// Initializes `env_logger` writing to stdout and filtered by `RUST_LOG`.
pub fn init() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG");

    if log_builder.try_init().is_ok() {
        info!("Logger initialized");
    }
}

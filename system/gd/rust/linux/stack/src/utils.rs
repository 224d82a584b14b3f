//! Utilities that are not specific to a particular profile

/// Inits logging, filtered by `RUST_LOG`. Later calls are no-ops.
pub fn init_logging() {
    env_logger::Builder::new().parse_default_env().try_init().ok();
}

//! Logging setup for examples and tests.

/// Install a `fmt` subscriber driven by `RUST_LOG`.
///
/// Examples and tests can call `wsmq::dev_tracing::init_tracing()` to see
/// the socket's `[Endpoint]` / `[DEALER]` / `[SUB]` diagnostics. This is a
/// no-op when `RUST_LOG` is not set or a global subscriber already exists.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

//! Shared support for the integration suites.

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install the log subscriber once per test binary. Filtering follows
/// `RUST_LOG`, and output goes through the test writer so it stays attached
/// to the owning test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

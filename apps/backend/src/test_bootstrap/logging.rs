//! Unit-test logging. Delegates to the shared test-support crate so unit
//! and integration tests configure tracing the same way (`TEST_LOG`,
//! then `RUST_LOG`, default `warn`).

pub fn init() {
    backend_test_support::logging::init();
}

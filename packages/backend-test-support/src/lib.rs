//! Shared test support for the Doodle Exchange backend.
//!
//! Unit tests and integration tests both call [`logging::init`] so that
//! subscriber setup happens exactly once per test binary.

pub mod logging;

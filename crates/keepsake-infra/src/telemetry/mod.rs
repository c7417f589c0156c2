//! Tracing initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either the
//! human-readable or the JSON formatter.

mod init_basic;

pub use init_basic::init_telemetry;

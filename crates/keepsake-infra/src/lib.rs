//! Keepsake Infrastructure Library
//!
//! Shared infrastructure used by the worker binary and the processing crate:
//! - Telemetry initialization (tracing-subscriber)
//! - Rate limiting for outbound calls

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "rate-limit")]
pub use rate_limit::RateLimiter;

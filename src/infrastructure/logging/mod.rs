//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty console output on stderr
//! - Optional rolling JSON log files

pub mod logger;

pub use logger::{LogFormat, LoggerImpl, RotationPolicy};

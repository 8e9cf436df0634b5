//! # plauder-observability
//!
//! Structured Logging fuer Plauder via tracing-subscriber, wahlweise als
//! lesbarer Text oder als JSON pro Zeile.

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingKonfig};

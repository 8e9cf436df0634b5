//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable (ueberschreibt die Konfigurationsdatei):
//! - `PLAUDER_LOG_LEVEL`: Filter-Ausdruck (z.B. `info`, `plauder_delivery=debug`)
//! - `PLAUDER_LOG_FORMAT`: `text` oder `json`

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "PLAUDER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "PLAUDER_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Error)]
#[error("Unbekanntes Log-Format '{0}' (erlaubt: text, json)")]
pub struct UnbekanntesFormat(String);

impl FromStr for LogFormat {
    type Err = UnbekanntesFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            anders => Err(UnbekanntesFormat(anders.to_string())),
        }
    }
}

/// Abschnitt `[logging]` der Server-Konfiguration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingKonfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingKonfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingKonfig {
    /// Wendet `PLAUDER_LOG_LEVEL` / `PLAUDER_LOG_FORMAT` an, falls gesetzt
    ///
    /// Ein unbekanntes Format in der Umgebung wird ignoriert.
    pub fn mit_umgebung(mut self) -> Self {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            self.level = level;
        }
        if let Ok(format) = std::env::var(ENV_LOG_FORMAT) {
            match format.parse() {
                Ok(f) => self.format = f,
                Err(e) => eprintln!("{e} – verwende {:?}", self.format),
            }
        }
        self
    }
}

/// Initialisiert das Logging-System.
///
/// Ein ungueltiger Filter-Ausdruck faellt auf `info` zurueck. Schlaegt fehl,
/// wenn bereits ein globaler Subscriber gesetzt ist.
pub fn logging_initialisieren(konfig: &LoggingKonfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&konfig.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let ergebnis = match konfig.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    ergebnis.map_err(|e| anyhow::anyhow!("Logging bereits initialisiert: {e}"))
}

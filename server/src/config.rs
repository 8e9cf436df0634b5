//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einzelne Umgebungsvariablen ueberschreiben die Datei.

use std::time::Duration;

use plauder_auth::TokenKonfig;
use plauder_db::DatabaseConfig;
use plauder_observability::LoggingKonfig;
use plauder_rpc::RpcKonfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub netzwerk: NetzwerkEinstellungen,
    pub datenbank: DatenbankEinstellungen,
    pub auth: AuthEinstellungen,
    /// Echtzeit-Zustellung (Stream-Puffer, Push-Zeitlimit)
    pub zustellung: ZustellungEinstellungen,
    pub logging: LoggingKonfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    pub bind_adresse: String,
    /// Port fuer gRPC
    pub port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        Self {
            url: "sqlite://plauder.db".into(),
            max_verbindungen: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEinstellungen {
    /// HMAC-Geheimnis fuer Tokens. In Produktion per PLAUDER_JWT_SECRET setzen.
    pub jwt_secret: String,
    pub token_gueltigkeit_stunden: i64,
    pub issuer: String,
}

impl Default for AuthEinstellungen {
    fn default() -> Self {
        let token = TokenKonfig::default();
        Self {
            jwt_secret: token.secret,
            token_gueltigkeit_stunden: token.gueltigkeit.num_hours(),
            issuer: token.issuer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZustellungEinstellungen {
    /// Kapazitaet des ausgehenden Puffers pro Stream
    pub sende_queue_groesse: usize,
    /// Zeitlimit pro Push in Millisekunden, 0 = keins
    pub push_timeout_ms: u64,
}

impl Default for ZustellungEinstellungen {
    fn default() -> Self {
        Self {
            sende_queue_groesse: 64,
            push_timeout_ms: 10_000,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!("Konfigurationsdatei '{pfad}' nicht gefunden, verwende Standardwerte");
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.umgebung_anwenden(|name| std::env::var(name).ok())?;
        config.logging = config.logging.mit_umgebung();
        config.pruefen()?;
        Ok(config)
    }

    pub fn aus_toml(inhalt: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(inhalt)
    }

    /// Ueberschreibt Felder aus `PORT`, `PLAUDER_DB_URL`, `PLAUDER_JWT_SECRET`
    pub fn umgebung_anwenden<F>(&mut self, lesen: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lesen("PORT") {
            self.netzwerk.port = port
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT '{port}' ungueltig: {e}"))?;
        }
        if let Some(url) = lesen("PLAUDER_DB_URL") {
            self.datenbank.url = url;
        }
        if let Some(secret) = lesen("PLAUDER_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }

    /// Weist offensichtlich unbrauchbare Werte ab
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.auth.jwt_secret.is_empty() {
            anyhow::bail!("auth.jwt_secret darf nicht leer sein");
        }
        if self.auth.token_gueltigkeit_stunden <= 0 {
            anyhow::bail!("auth.token_gueltigkeit_stunden muss positiv sein");
        }
        if self.zustellung.sende_queue_groesse == 0 {
            anyhow::bail!("zustellung.sende_queue_groesse muss mindestens 1 sein");
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer gRPC zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
        }
    }

    pub fn token_konfig(&self) -> TokenKonfig {
        TokenKonfig {
            secret: self.auth.jwt_secret.clone(),
            gueltigkeit: chrono::Duration::hours(self.auth.token_gueltigkeit_stunden),
            issuer: self.auth.issuer.clone(),
        }
    }

    pub fn rpc_konfig(&self) -> RpcKonfig {
        RpcKonfig {
            sende_queue_groesse: self.zustellung.sende_queue_groesse,
            push_zeitlimit: match self.zustellung.push_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plauder_observability::LogFormat;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.netzwerk.port, 8080);
        assert_eq!(cfg.datenbank.url, "sqlite://plauder.db");
        assert_eq!(cfg.auth.issuer, "Kopdar");
        assert_eq!(cfg.auth.token_gueltigkeit_stunden, 24);
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.pruefen().is_ok());
    }

    #[test]
    fn bind_adresse() {
        assert_eq!(ServerConfig::default().bind_adresse(), "0.0.0.0:8080");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [netzwerk]
            port = 50051

            [zustellung]
            push_timeout_ms = 0

            [logging]
            format = "json"
        "#;
        let cfg = ServerConfig::aus_toml(toml).unwrap();
        assert_eq!(cfg.netzwerk.port, 50051);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.rpc_konfig().push_zeitlimit, None);
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.netzwerk.bind_adresse, "0.0.0.0");
        assert_eq!(cfg.zustellung.sende_queue_groesse, 64);
    }

    #[test]
    fn umgebung_ueberschreibt_datei() {
        let mut cfg = ServerConfig::default();
        cfg.umgebung_anwenden(|name| match name {
            "PORT" => Some("9000".into()),
            "PLAUDER_JWT_SECRET" => Some("geheim".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(cfg.netzwerk.port, 9000);
        assert_eq!(cfg.auth.jwt_secret, "geheim");
        assert_eq!(cfg.datenbank.url, "sqlite://plauder.db");
    }

    #[test]
    fn ungueltiger_port_aus_umgebung() {
        let mut cfg = ServerConfig::default();
        let err = cfg
            .umgebung_anwenden(|name| (name == "PORT").then(|| "achtzig".into()))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn leeres_secret_abgewiesen() {
        let mut cfg = ServerConfig::default();
        cfg.auth.jwt_secret.clear();
        assert!(cfg.pruefen().is_err());
    }

    #[test]
    fn standard_push_zeitlimit_zehn_sekunden() {
        let cfg = ServerConfig::default();
        assert_eq!(
            cfg.rpc_konfig().push_zeitlimit,
            Some(Duration::from_secs(10))
        );
    }
}

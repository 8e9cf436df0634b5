//! plauder-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Token-Service, Echtzeit-Zustellung und gRPC-Server.

pub mod config;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use config::ServerConfig;
use plauder_auth::TokenService;
use plauder_db::SqliteDb;
use plauder_delivery::ConnectionRegistry;
use plauder_rpc::{AuthInterceptor, ChatServiceImpl, RpcServer};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    registry: ConnectionRegistry,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::neu(),
        }
    }

    /// Registry der offenen Streams
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Startet den Server und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        self.starten_bis(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Warten auf Ctrl-C fehlgeschlagen");
            }
        })
        .await
    }

    /// Startet den Server und laeuft bis `signal` ausloest
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren
    /// 2. Token-Service, Registry und ChatService aufbauen
    /// 3. gRPC bedienen
    /// 4. Beim Signal alle offenen Streams regulaer schliessen, dann stoppen
    pub async fn starten_bis<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.bind_adresse().parse().map_err(|e| {
            anyhow::anyhow!("Bind-Adresse '{}' ungueltig: {e}", self.config.bind_adresse())
        })?;

        tracing::info!(
            adresse = %addr,
            datenbank = %self.config.datenbank.url,
            "Server startet"
        );

        let db = Arc::new(SqliteDb::oeffnen(&self.config.datenbank_config()).await?);
        let tokens = Arc::new(TokenService::neu(self.config.token_konfig()));

        let service = ChatServiceImpl::neu(
            db,
            Arc::clone(&tokens),
            self.registry.clone(),
            self.config.rpc_konfig(),
        );
        let rpc = RpcServer::neu(service, AuthInterceptor::neu(tokens));

        // alle_schliessen sperrt die Registry auch fuer neue Streams, sonst
        // wartet der graceful Shutdown auf spaet geoeffnete
        let registry = self.registry.clone();
        rpc.starten(addr, async move {
            signal.await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let geschlossen = registry.alle_schliessen();
            tracing::info!(streams = geschlossen, "Offene Streams geschlossen");
        })
        .await?;

        Ok(())
    }
}

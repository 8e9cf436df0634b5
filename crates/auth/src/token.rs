//! HS256-JWT fuer authentifizierte RPC-Aufrufe
//!
//! Das Token traegt die Benutzer-Identitaet (E-Mail) im `sub`-Claim.
//! Die RPC-Schicht prueft es pro Aufruf und vertraut danach der Identitaet.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use plauder_core::UserIdentity;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Claims eines Plauder-Tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identitaet des Benutzers (E-Mail)
    pub sub: String,
    /// Anzeigename zum Zeitpunkt der Ausstellung
    pub name: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Konfiguration des Token-Service
#[derive(Debug, Clone)]
pub struct TokenKonfig {
    /// Gemeinsames HMAC-Geheimnis
    pub secret: String,
    /// Gueltigkeitsdauer eines ausgestellten Tokens
    pub gueltigkeit: Duration,
    /// Erwarteter und gesetzter `iss`-Claim
    pub issuer: String,
}

impl Default for TokenKonfig {
    fn default() -> Self {
        Self {
            secret: "plauder-entwicklung".into(),
            gueltigkeit: Duration::hours(24),
            issuer: "Kopdar".into(),
        }
    }
}

/// Stellt Tokens aus und prueft sie
#[derive(Clone)]
pub struct TokenService {
    konfig: TokenKonfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn neu(konfig: TokenKonfig) -> Self {
        let encoding_key = EncodingKey::from_secret(konfig.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(konfig.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[konfig.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Self {
            konfig,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    /// Stellt ein neues Token fuer `identitaet` aus
    pub fn ausstellen(&self, identitaet: &UserIdentity, name: &str) -> AuthResult<String> {
        let jetzt = Utc::now();
        let claims = Claims {
            sub: identitaet.als_str().to_string(),
            name: name.to_string(),
            iss: self.konfig.issuer.clone(),
            iat: jetzt.timestamp(),
            exp: (jetzt + self.konfig.gueltigkeit).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Ausstellung(e.to_string()))?;

        tracing::debug!(identity = %identitaet, "Token ausgestellt");
        Ok(token)
    }

    /// Prueft Signatur, Issuer und Ablauf und gibt die Claims zurueck
    pub fn pruefen(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|daten| daten.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenAbgelaufen,
                _ => AuthError::TokenUngueltig(e.to_string()),
            })
    }

    /// Prueft das Token und gibt die darin enthaltene Identitaet zurueck
    pub fn identitaet_pruefen(&self, token: &str) -> AuthResult<UserIdentity> {
        let claims = self.pruefen(token)?;
        UserIdentity::neu(claims.sub).map_err(|_| AuthError::IdentitaetFehlt)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.konfig.issuer)
            .field("gueltigkeit", &self.konfig.gueltigkeit)
            .finish_non_exhaustive()
    }
}

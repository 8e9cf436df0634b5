//! Gemeinsame Identifikationstypen fuer Plauder
//!
//! Alle Schluessel verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Benutzer-Identitaet und Raum-Schluessel zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};

use crate::error::PlauderError;

/// Stabile Identitaet eines authentifizierten Benutzers (E-Mail-Adresse)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// Erstellt eine Identitaet, leere Werte werden abgelehnt
    pub fn neu(wert: impl Into<String>) -> Result<Self, PlauderError> {
        let wert = wert.into();
        let wert = wert.trim();
        if wert.is_empty() {
            return Err(PlauderError::UngueltigeEingabe(
                "Benutzer-Identitaet darf nicht leer sein".into(),
            ));
        }
        Ok(Self(wert.to_string()))
    }

    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Schluessel eines Chat-Raums
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Erstellt einen Raum-Schluessel, leere Werte werden abgelehnt
    pub fn neu(wert: impl Into<String>) -> Result<Self, PlauderError> {
        let wert = wert.into();
        let wert = wert.trim();
        if wert.is_empty() {
            return Err(PlauderError::UngueltigeEingabe(
                "Raum-Schluessel darf nicht leer sein".into(),
            ));
        }
        Ok(Self(wert.to_string()))
    }

    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room:{}", self.0)
    }
}

/// Art eines Raums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Private,
    Public,
    Broadcast,
}

impl RoomType {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
            Self::Broadcast => "broadcast",
        }
    }
}

impl std::str::FromStr for RoomType {
    type Err = PlauderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            "broadcast" => Ok(Self::Broadcast),
            other => Err(PlauderError::UngueltigeEingabe(format!(
                "Unbekannter Raum-Typ: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.als_str())
    }
}

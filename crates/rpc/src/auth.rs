//! Auth-Interceptor fuer den ChatService
//!
//! Liest `authorization: Bearer <token>` aus den Metadaten, prueft das Token
//! und legt die Identitaet als [`AuthenticatedUser`] in die Request-Extensions.
//! Aufrufe ohne Token werden durchgelassen, die Handler geschuetzter Methoden
//! verlangen die Identitaet ueber [`angemeldet`]. Ein vorhandenes aber
//! ungueltiges Token wird sofort abgewiesen.

use std::sync::Arc;

use plauder_auth::TokenService;
use plauder_core::UserIdentity;
use tonic::metadata::MetadataMap;
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Vom Interceptor bestaetigte Identitaet des Aufrufers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserIdentity);

#[derive(Clone)]
pub struct AuthInterceptor {
    tokens: Arc<TokenService>,
}

impl AuthInterceptor {
    pub fn neu(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let Some(token) = bearer_token(request.metadata())? else {
            return Ok(request);
        };

        let identity = self.tokens.identitaet_pruefen(token).map_err(|e| {
            tracing::debug!(fehler = %e, "Token abgewiesen");
            Status::unauthenticated("Ungueltiger oder abgelaufener Token")
        })?;

        request.extensions_mut().insert(AuthenticatedUser(identity));
        Ok(request)
    }
}

fn bearer_token(metadata: &MetadataMap) -> Result<Option<&str>, Status> {
    let Some(wert) = metadata.get("authorization") else {
        return Ok(None);
    };
    wert.to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(Some)
        .ok_or_else(|| Status::unauthenticated("Authorization-Metadaten ungueltig"))
}

/// Identitaet des Aufrufers oder `UNAUTHENTICATED`
pub fn angemeldet<T>(request: &Request<T>) -> Result<UserIdentity, Status> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|a| a.0.clone())
        .ok_or_else(|| Status::unauthenticated("Authorization-Metadaten fehlen"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plauder_auth::TokenKonfig;
    use tonic::Code;

    fn interceptor() -> (AuthInterceptor, Arc<TokenService>) {
        let tokens = Arc::new(TokenService::neu(TokenKonfig::default()));
        (AuthInterceptor::neu(Arc::clone(&tokens)), tokens)
    }

    fn mit_header(wert: &str) -> Request<()> {
        let mut request = Request::new(());
        request
            .metadata_mut()
            .insert("authorization", wert.parse().unwrap());
        request
    }

    #[test]
    fn gueltiges_token_setzt_identitaet() {
        let (mut icp, tokens) = interceptor();
        let id = UserIdentity::neu("a@example.com").unwrap();
        let token = tokens.ausstellen(&id, "Anna").unwrap();

        let request = icp.call(mit_header(&format!("Bearer {token}"))).unwrap();
        assert_eq!(angemeldet(&request).unwrap(), id);
    }

    #[test]
    fn ohne_token_durchgelassen_aber_nicht_angemeldet() {
        let (mut icp, _) = interceptor();
        let request = icp.call(Request::new(())).unwrap();
        assert_eq!(angemeldet(&request).unwrap_err().code(), Code::Unauthenticated);
    }

    #[test]
    fn falsches_token_abgewiesen() {
        let (mut icp, _) = interceptor();
        let status = icp.call(mit_header("Bearer kein.gueltiges.token")).unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }

    #[test]
    fn fehlendes_bearer_praefix_abgewiesen() {
        let (mut icp, _) = interceptor();
        let status = icp.call(mit_header("Basic abc")).unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }
}

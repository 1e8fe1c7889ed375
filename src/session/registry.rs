use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use moka::future::Cache;

use super::token::{SessionToken, TokenIssuer};
use crate::error::LedgerError;

/// Live kiosk tokens, dropped once their window has passed.
pub struct SessionRegistry {
    issuer: TokenIssuer,
    live: Cache<String, SessionToken>,
}

impl SessionRegistry {
    pub fn new(issuer: TokenIssuer) -> Self {
        let ttl = issuer.window().to_std().unwrap_or(Duration::from_secs(300));
        Self {
            issuer,
            live: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn issue(&self, now: DateTime<FixedOffset>) -> SessionToken {
        let token = self.issuer.issue(now);
        self.live.insert(token.value.clone(), token.clone()).await;
        token
    }

    /// Resolves a scanned value to the token it was issued as.
    ///
    /// Unknown, malformed and expired values all fail with
    /// [`LedgerError::InvalidOrExpiredToken`].
    pub async fn resolve(
        &self,
        scanned: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<SessionToken, LedgerError> {
        let scanned = scanned.trim();
        SessionToken::parse(scanned, *now.offset())?;

        let token = self
            .live
            .get(scanned)
            .await
            .ok_or(LedgerError::InvalidOrExpiredToken)?;

        self.issuer.validate(&token, scanned, now)?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ist_at;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(TokenIssuer::new(chrono::Duration::minutes(5)))
    }

    #[actix_web::test]
    async fn issued_token_resolves_inside_window() {
        let registry = registry();
        let token = registry.issue(ist_at(2026, 1, 12, 9, 0, 0)).await;
        let resolved = registry
            .resolve(&token.value, ist_at(2026, 1, 12, 9, 3, 0))
            .await
            .unwrap();
        assert_eq!(resolved, token);
    }

    #[actix_web::test]
    async fn expired_token_is_rejected() {
        let registry = registry();
        let token = registry.issue(ist_at(2026, 1, 12, 9, 0, 0)).await;
        assert!(matches!(
            registry.resolve(&token.value, ist_at(2026, 1, 12, 9, 6, 0)).await,
            Err(LedgerError::InvalidOrExpiredToken)
        ));
    }

    #[actix_web::test]
    async fn well_formed_but_unissued_token_is_rejected() {
        let registry = registry();
        let now = ist_at(2026, 1, 12, 9, 0, 0);
        let forged = TokenIssuer::new(chrono::Duration::minutes(5)).issue(now);
        assert!(registry.resolve(&forged.value, now).await.is_err());
    }
}

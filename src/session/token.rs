use chrono::{DateTime, Duration, FixedOffset};
use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::LedgerError;

const TOKEN_PREFIX: &str = "QR";

/// Short-lived value shown as a QR code at the check-in kiosk.
///
/// The string form is `QR-<unix seconds>-<uuid>`; the creation time travels
/// inside the token so the scan side can reject stale codes without lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display, ToSchema)]
#[display(fmt = "{}", value)]
pub struct SessionToken {
    #[schema(example = "QR-1768189500-67e55044-10b1-426f-9247-bb680e5fe0c8")]
    pub value: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<FixedOffset>,
}

impl SessionToken {
    /// Recovers the embedded creation time from a token string.
    pub fn parse(value: &str, offset: FixedOffset) -> Result<Self, LedgerError> {
        let mut parts = value.splitn(3, '-');
        let (Some(TOKEN_PREFIX), Some(secs), Some(nonce)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(LedgerError::InvalidOrExpiredToken);
        };

        Uuid::parse_str(nonce).map_err(|_| LedgerError::InvalidOrExpiredToken)?;
        let secs: i64 = secs.parse().map_err(|_| LedgerError::InvalidOrExpiredToken)?;
        let created_at = DateTime::from_timestamp(secs, 0)
            .ok_or(LedgerError::InvalidOrExpiredToken)?
            .with_timezone(&offset);

        Ok(Self {
            value: value.to_string(),
            created_at,
        })
    }
}

/// Issues and checks session tokens. Holds no attendance state.
#[derive(Debug, Clone, Copy)]
pub struct TokenIssuer {
    window: Duration,
}

impl TokenIssuer {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn issue(&self, now: DateTime<FixedOffset>) -> SessionToken {
        // whole seconds, matching what the string form can carry
        let secs = now.timestamp();
        let created_at = DateTime::from_timestamp(secs, 0)
            .map(|t| t.with_timezone(now.offset()))
            .unwrap_or(now);

        SessionToken {
            value: format!("{}-{}-{}", TOKEN_PREFIX, secs, Uuid::new_v4()),
            created_at,
        }
    }

    pub fn expires_at(&self, token: &SessionToken) -> DateTime<FixedOffset> {
        token.created_at + self.window
    }

    pub fn is_valid(&self, token: &SessionToken, scanned: &str, now: DateTime<FixedOffset>) -> bool {
        scanned == token.value && now <= self.expires_at(token)
    }

    pub fn validate(
        &self,
        token: &SessionToken,
        scanned: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<(), LedgerError> {
        if self.is_valid(token, scanned, now) {
            Ok(())
        } else {
            Err(LedgerError::InvalidOrExpiredToken)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ist, ist_at};

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Duration::minutes(5))
    }

    #[test]
    fn valid_within_window_inclusive() {
        let now = ist_at(2026, 1, 12, 9, 0, 0);
        let token = issuer().issue(now);
        assert!(issuer().is_valid(&token, &token.value, now));
        assert!(issuer().is_valid(&token, &token.value, ist_at(2026, 1, 12, 9, 5, 0)));
        assert!(!issuer().is_valid(&token, &token.value, ist_at(2026, 1, 12, 9, 5, 1)));
    }

    #[test]
    fn mismatched_scan_fails_closed() {
        let now = ist_at(2026, 1, 12, 9, 0, 0);
        let token = issuer().issue(now);
        let other = issuer().issue(now);
        assert!(matches!(
            issuer().validate(&token, &other.value, now),
            Err(LedgerError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn creation_time_round_trips_through_string() {
        let now = ist_at(2026, 1, 12, 9, 0, 0);
        let token = issuer().issue(now);
        let parsed = SessionToken::parse(&token.to_string(), ist()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        for raw in ["", "QR", "QR-abc-67e55044-10b1-426f-9247-bb680e5fe0c8", "XX-1-67e55044-10b1-426f-9247-bb680e5fe0c8", "QR-1-not-a-uuid"] {
            assert!(SessionToken::parse(raw, ist()).is_err(), "{raw}");
        }
    }
}

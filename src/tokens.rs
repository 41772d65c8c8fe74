//! Signed tokens: bearer sessions and email confirmation links.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::dto::auth::{Claims, ConfirmationClaims};

/// Seconds an email confirmation link stays valid.
pub const CONFIRMATION_WINDOW_SECS: i64 = 3600;
pub const SESSION_TTL_HOURS: i64 = 24;

const SESSION_PURPOSE: &str = "session";
const CONFIRMATION_PURPOSE: &str = "email-confirmation";

pub fn issue_session_token(secret: &str, user_id: i32) -> anyhow::Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_TTL_HOURS))
        .ok_or_else(|| anyhow::anyhow!("Failed to set expiration"))?;
    let claims = Claims {
        sub: user_id.to_string(),
        purpose: SESSION_PURPOSE.to_string(),
        exp: expiration.timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Returns the user id a session token was issued for, or `None` when the
/// token is invalid, expired or of another kind.
pub fn decode_session_token(secret: &str, token: &str) -> Option<i32> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .ok()?;
    if decoded.claims.purpose != SESSION_PURPOSE {
        return None;
    }
    decoded.claims.sub.parse().ok()
}

/// Sign `email` into a link token that expires `CONFIRMATION_WINDOW_SECS`
/// after `issued_at`.
pub fn issue_confirmation_token(
    secret: &str,
    email: &str,
    issued_at: DateTime<Utc>,
) -> anyhow::Result<String> {
    let claims = ConfirmationClaims {
        sub: email.to_string(),
        purpose: CONFIRMATION_PURPOSE.to_string(),
        iat: issued_at.timestamp(),
        exp: issued_at.timestamp() + CONFIRMATION_WINDOW_SECS,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// The email embedded in a still-valid confirmation token.
pub fn verify_confirmation_token(secret: &str, token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let decoded = decode::<ConfirmationClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;
    if decoded.claims.purpose != CONFIRMATION_PURPOSE {
        return None;
    }
    Some(decoded.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn session_token_round_trips_user_id() {
        let token = issue_session_token(SECRET, 42).unwrap();
        assert_eq!(decode_session_token(SECRET, &token), Some(42));
        assert_eq!(decode_session_token("other-secret", &token), None);
    }

    #[test]
    fn confirmation_token_is_not_a_session() {
        let token = issue_confirmation_token(SECRET, "a@example.com", Utc::now()).unwrap();
        assert_eq!(decode_session_token(SECRET, &token), None);

        let session = issue_session_token(SECRET, 1).unwrap();
        assert_eq!(verify_confirmation_token(SECRET, &session), None);
    }

    #[test]
    fn confirmation_window_edges() {
        let window = Duration::seconds(CONFIRMATION_WINDOW_SECS);

        let almost_expired = Utc::now() - window + Duration::seconds(1);
        let token = issue_confirmation_token(SECRET, "a@example.com", almost_expired).unwrap();
        assert_eq!(
            verify_confirmation_token(SECRET, &token).as_deref(),
            Some("a@example.com")
        );

        let just_expired = Utc::now() - window - Duration::seconds(1);
        let token = issue_confirmation_token(SECRET, "a@example.com", just_expired).unwrap();
        assert_eq!(verify_confirmation_token(SECRET, &token), None);
    }

    #[test]
    fn tampered_confirmation_token_is_rejected() {
        let token = issue_confirmation_token(SECRET, "a@example.com", Utc::now()).unwrap();
        assert_eq!(verify_confirmation_token("other", &token), None);
        assert_eq!(verify_confirmation_token(SECRET, "not-a-token"), None);
    }
}

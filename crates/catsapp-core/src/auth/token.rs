//! Expiry inspection for bearer tokens.
//!
//! Tokens are `header.payload.signature` with a base64url JSON payload
//! carrying a numeric `exp` claim in Unix seconds. Signatures are not
//! verified here; the server remains the authority. Anything that cannot
//! be decoded counts as expired.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<f64>,
}

/// The `exp` claim of `token` in Unix seconds.
pub fn expiry_seconds(token: &str) -> Option<f64> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.exp.filter(|exp| exp.is_finite())
}

pub fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let exp = expiry_seconds(token)?;
    DateTime::from_timestamp_millis((exp * 1000.0) as i64)
}

/// True unless `token` decodes to an `exp` that is not before `now`.
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(exp) = token.and_then(expiry_seconds) else {
        return true;
    };
    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    exp < now_secs
}

pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

#[cfg(test)]
pub(crate) fn token_with_payload(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> String {
    token_with_payload(&format!(r#"{{"sub":"u1","exp":{}}}"#, exp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_absent_token_is_expired() {
        assert!(is_expired(None));
    }

    #[test]
    fn test_malformed_tokens_are_expired() {
        assert!(is_expired(Some("")));
        assert!(is_expired(Some("opaque-token")));
        assert!(is_expired(Some("only.two")));
        assert!(is_expired(Some("a.b.c.d")));
        assert!(is_expired(Some("header.!!!not-base64!!!.sig")));

        let not_json = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(is_expired(Some(&not_json)));
    }

    #[test]
    fn test_payload_without_exp_is_expired() {
        let token = token_with_payload(r#"{"sub":"u1"}"#);
        assert!(is_expired(Some(&token)));

        let token = token_with_payload(r#"{"exp":"tomorrow"}"#);
        assert!(is_expired(Some(&token)));
    }

    #[test]
    fn test_exp_in_past_is_expired() {
        let past = Utc::now() - Duration::minutes(5);
        let token = token_expiring_at(past.timestamp());
        assert!(is_expired(Some(&token)));
    }

    #[test]
    fn test_exp_in_future_is_valid() {
        let future = Utc::now() + Duration::hours(1);
        let token = token_expiring_at(future.timestamp());
        assert!(!is_expired(Some(&token)));
        assert_eq!(expiry(&token).map(|t| t.timestamp()), Some(future.timestamp()));
    }

    #[test]
    fn test_exp_boundary() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let token = token_expiring_at(1_700_000_000);
        assert!(!is_expired_at(Some(&token), now));
        assert!(is_expired_at(Some(&token), now + Duration::seconds(1)));
    }

    #[test]
    fn test_padded_standard_payload_is_accepted() {
        // Some issuers pad the payload segment
        let payload = base64::engine::general_purpose::STANDARD.encode(r#"{"exp": 4102444800}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{}.s", payload);
        assert_eq!(expiry_seconds(&token), Some(4_102_444_800.0));
    }
}

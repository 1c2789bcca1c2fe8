use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::session::{SessionClaims, SessionContext, SessionSubject};

type HmacSha256 = Hmac<Sha256>;

/// Validate a signed session token and build the typed session context.
///
/// Token format is `header.claims.signature`, base64url without padding,
/// signed with HMAC-SHA256 over `header.claims`.
pub fn validate_token(token: &str, secret: &str) -> Result<SessionContext, String> {
    if secret.is_empty() {
        return Err("Session token secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signing_input = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };
    mac.update(signing_input.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: SessionClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp();
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let subject = match claims.role.as_str() {
        "patient" => SessionSubject::Patient(claims.sub),
        "dentiste" => SessionSubject::Dentiste(claims.sub),
        other => {
            debug!("Unknown session role: {}", other);
            return Err("Unknown session role".to_string());
        }
    };

    let issued_at = claims
        .iat
        .and_then(|timestamp| Utc.timestamp_opt(timestamp, 0).single());

    let session = SessionContext {
        subject,
        email: claims.email,
        issued_at,
    };

    debug!("Token validated for {:?}", session.subject);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestSession;

    const SECRET: &str = "test-secret-key-for-token-validation-must-be-long-enough";

    #[test]
    fn valid_patient_token_builds_patient_subject() {
        let token = TestSession::patient(12).to_token(SECRET);
        let session = validate_token(&token, SECRET).unwrap();
        assert_eq!(session.subject, SessionSubject::Patient(12));
    }

    #[test]
    fn valid_dentiste_token_builds_dentiste_subject() {
        let token = TestSession::dentiste(4).to_token(SECRET);
        let session = validate_token(&token, SECRET).unwrap();
        assert_eq!(session.subject, SessionSubject::Dentiste(4));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = TestSession::patient(1).to_token("some-other-secret");
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = TestSession::patient(1).to_expired_token(SECRET);
        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(validate_token("not.a-token", SECRET).is_err());
        assert!(validate_token("", SECRET).is_err());
    }
}

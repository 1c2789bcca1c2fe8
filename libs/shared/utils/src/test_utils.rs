use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shared_config::AppConfig;
use shared_models::session::{SessionContext, SessionSubject};

pub struct TestConfig {
    pub clinic_api_url: String,
    pub clinic_files_url: String,
    pub session_token_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: "http://localhost:8080/dentiste/api".to_string(),
            clinic_files_url: "http://localhost:8080/dentiste/api/files".to_string(),
            session_token_secret: "test-secret-key-for-token-validation-must-be-long-enough"
                .to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a wiremock server standing in for the clinic API.
    pub fn with_backend(base_url: &str) -> Self {
        Self {
            clinic_api_url: base_url.to_string(),
            clinic_files_url: format!("{}/files", base_url),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            clinic_api_url: self.clinic_api_url.clone(),
            clinic_files_url: self.clinic_files_url.clone(),
            session_token_secret: self.session_token_secret.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestSession {
    pub subject: SessionSubject,
    pub email: String,
}

impl TestSession {
    pub fn patient(id: i64) -> Self {
        Self {
            subject: SessionSubject::Patient(id),
            email: format!("patient{}@example.com", id),
        }
    }

    pub fn dentiste(id: i64) -> Self {
        Self {
            subject: SessionSubject::Dentiste(id),
            email: format!("dentiste{}@example.com", id),
        }
    }

    pub fn to_context(&self) -> SessionContext {
        SessionContext {
            subject: self.subject,
            email: Some(self.email.clone()),
            issued_at: Some(Utc::now()),
        }
    }

    pub fn to_token(&self, secret: &str) -> String {
        self.token_with_exp(secret, Utc::now() + Duration::hours(24))
    }

    pub fn to_expired_token(&self, secret: &str) -> String {
        self.token_with_exp(secret, Utc::now() - Duration::hours(1))
    }

    fn token_with_exp(&self, secret: &str, exp: chrono::DateTime<Utc>) -> String {
        let (sub, role) = match self.subject {
            SessionSubject::Patient(id) => (id, "patient"),
            SessionSubject::Dentiste(id) => (id, "dentiste"),
        };

        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let claims = json!({
            "sub": sub,
            "role": role,
            "email": self.email,
            "iat": Utc::now().timestamp(),
            "exp": exp.timestamp(),
        });

        let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_encoded = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_encoded, claims_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }
}

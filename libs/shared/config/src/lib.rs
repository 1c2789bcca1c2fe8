use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clinic_api_url: String,
    pub clinic_files_url: String,
    pub session_token_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            clinic_api_url: env::var("CLINIC_API_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_API_URL not set, using empty value");
                    String::new()
                }),
            clinic_files_url: env::var("CLINIC_FILES_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_FILES_URL not set, falling back to CLINIC_API_URL + /files");
                    env::var("CLINIC_API_URL")
                        .map(|base| format!("{}/files", base))
                        .unwrap_or_default()
                }),
            session_token_secret: env::var("SESSION_TOKEN_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SESSION_TOKEN_SECRET not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.clinic_api_url.is_empty()
            && !self.session_token_secret.is_empty()
    }
}

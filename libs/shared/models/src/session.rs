use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who a validated session token belongs to. The id is the backend's
/// numeric identifier (`idP` for patients, `idD` for dentists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum SessionSubject {
    Patient(i64),
    Dentiste(i64),
}

impl SessionSubject {
    pub fn patient_id(&self) -> Option<i64> {
        match self {
            SessionSubject::Patient(id) => Some(*id),
            SessionSubject::Dentiste(_) => None,
        }
    }

    pub fn dentiste_id(&self) -> Option<i64> {
        match self {
            SessionSubject::Patient(_) => None,
            SessionSubject::Dentiste(id) => Some(*id),
        }
    }

    pub fn is_dentiste(&self) -> bool {
        matches!(self, SessionSubject::Dentiste(_))
    }
}

/// Typed session state, constructed once by the auth middleware and
/// injected into request extensions. Components never read session data
/// from anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub subject: SessionSubject,
    pub email: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
}

/// Claims carried by the signed session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: i64,
    pub role: String,
    pub email: Option<String>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_exposes_only_its_own_id() {
        let patient = SessionSubject::Patient(7);
        assert_eq!(patient.patient_id(), Some(7));
        assert_eq!(patient.dentiste_id(), None);
        assert!(!patient.is_dentiste());

        let dentiste = SessionSubject::Dentiste(3);
        assert_eq!(dentiste.dentiste_id(), Some(3));
        assert_eq!(dentiste.patient_id(), None);
        assert!(dentiste.is_dentiste());
    }
}

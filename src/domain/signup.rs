use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::classification::Classification;
use crate::domain::new_signup::NewSignup;
use crate::domain::waitlist_email::WaitlistEmail;

/// Persisted registrant record, unique per normalized email. Immutable after
/// creation; there is no update or delete path.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: WaitlistEmail,
    pub university: String,
    pub is_priority_email: bool,
    pub email_domain: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub source: SourceMetadata,
}

/// Request provenance captured at admission time, all best-effort.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl Signup {
    pub fn admit(
        new_signup: NewSignup,
        classification: &Classification,
        source: SourceMetadata,
    ) -> Signup {
        Signup {
            id: Uuid::new_v4(),
            name: new_signup.name.map(|name| name.as_ref().to_string()),
            email: new_signup.email,
            university: new_signup.university,
            is_priority_email: classification.is_priority_email,
            email_domain: classification.domain.clone(),
            created_at: Utc::now(),
            source,
        }
    }
}

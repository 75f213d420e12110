use crate::config::WaitlistSettings;
use crate::domain::waitlist_email::WaitlistEmail;

/// Semantic tags derived from a normalized email. Pure and deterministic given
/// the configured domain lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_priority_email: bool,
    pub is_common_provider: bool,
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailType {
    Priority,
    Common,
    Other,
}

#[derive(thiserror::Error, Debug)]
pub enum ClassificationError {
    #[error("{0} does not contain an '@' symbol")]
    MalformedEmail(String),
}

impl Classification {
    /// Should be unreachable for an email that went through validation, but the
    /// classifier stays defensive about values read back from a store.
    pub fn derive(
        email: &WaitlistEmail,
        settings: &WaitlistSettings,
    ) -> Result<Classification, ClassificationError> {
        let domain = email
            .domain()
            .ok_or_else(|| ClassificationError::MalformedEmail(email.as_ref().to_string()))?
            .to_lowercase();

        // Substring match on purpose: a broad net for institutional affiliation.
        // A typo'd domain containing the suffix also matches; accepted tradeoff.
        let is_priority_email = settings
            .priority_domain_suffixes
            .iter()
            .any(|suffix| domain.contains(&suffix.to_lowercase()));

        let is_common_provider = settings
            .common_provider_domains
            .iter()
            .any(|provider| domain == provider.to_lowercase());

        Ok(Classification {
            is_priority_email,
            is_common_provider,
            domain,
        })
    }

    pub fn email_type(&self) -> EmailType {
        if self.is_priority_email {
            EmailType::Priority
        } else if self.is_common_provider {
            EmailType::Common
        } else {
            EmailType::Other
        }
    }
}

impl AsRef<str> for EmailType {
    fn as_ref(&self) -> &str {
        match self {
            EmailType::Priority => "priority",
            EmailType::Common => "common",
            EmailType::Other => "other",
        }
    }
}

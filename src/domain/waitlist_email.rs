use validator::validate_email;

use crate::domain::new_signup::SignupValidationError;

/// Normalized email address: trimmed, lower-cased and syntax checked. Acts as
/// the unique identity key of a registrant across both stores.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WaitlistEmail(String);

impl WaitlistEmail {
    pub fn parse(email: String) -> Result<WaitlistEmail, SignupValidationError> {
        let normalized = email.trim().to_lowercase();

        if !validate_email(&normalized) {
            return Err(SignupValidationError::InvalidEmailFormat);
        }

        // validate_email follows HTML5 rules and lets a dotless domain through
        // ("student@test"); we require the local-part@domain.tld shape.
        let has_dotted_domain = normalized
            .split_once('@')
            .map(|(_, domain)| domain.contains('.'))
            .unwrap_or(false);

        if !has_dotted_domain {
            return Err(SignupValidationError::InvalidEmailFormat);
        }

        Ok(Self(normalized))
    }

    /// Substring strictly after the first '@'. None only for a value that
    /// bypassed `parse`, which the classifier treats as malformed.
    pub fn domain(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, domain)| domain)
    }
}

impl AsRef<str> for WaitlistEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

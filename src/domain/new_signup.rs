use serde::Deserialize;

use crate::config::WaitlistSettings;
use crate::domain::signup_name::SignupName;
use crate::domain::waitlist_email::WaitlistEmail;

/// Raw form payload as received from the landing page.
#[derive(Deserialize, Debug)]
pub struct SignupBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub university: Option<String>,
}

/// A submission that passed every admission rule. The only way to build one is
/// `parse`, so downstream code never sees an unvalidated payload.
#[derive(Debug)]
pub struct NewSignup {
    pub name: Option<SignupName>,
    pub email: WaitlistEmail,
    pub university: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SignupValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmailFormat,
    #[error("That name doesn't look right")]
    InvalidName,
    #[error("Please select your university")]
    InvalidUniversity,
    #[error("{0} looks misspelled, double-check your email address")]
    SuspectedTypo(String),
}

impl NewSignup {
    /// Rules are applied in a fixed order so the first failure reported is
    /// stable: required fields, then email format, then the university list,
    /// then suspected provider typos.
    pub fn parse(
        body: SignupBody,
        settings: &WaitlistSettings,
    ) -> Result<NewSignup, SignupValidationError> {
        let raw_email = non_empty(body.email).ok_or(SignupValidationError::MissingField("email"))?;
        let raw_university =
            non_empty(body.university).ok_or(SignupValidationError::MissingField("university"))?;

        let raw_name = non_empty(body.name);
        if settings.name_required && raw_name.is_none() {
            return Err(SignupValidationError::MissingField("name"));
        }

        let email = WaitlistEmail::parse(raw_email)?;

        let university = raw_university.trim().to_string();
        if let Some(allow_list) = &settings.university_allow_list {
            let is_known = allow_list
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(&university));

            if !is_known {
                return Err(SignupValidationError::InvalidUniversity);
            }
        }

        if let Some(domain) = email.domain() {
            if let Some(typo) = settings
                .suspected_typo_domains
                .iter()
                .find(|candidate| domain.eq_ignore_ascii_case(candidate))
            {
                return Err(SignupValidationError::SuspectedTypo(typo.clone()));
            }
        }

        let name = raw_name.map(SignupName::parse).transpose()?;

        Ok(NewSignup {
            name,
            email,
            university,
        })
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

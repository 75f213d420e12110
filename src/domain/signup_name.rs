use unicode_segmentation::UnicodeSegmentation;

use crate::domain::new_signup::SignupValidationError;

const MAX_CHAR_LENGHT: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];

#[derive(Debug, Clone, serde::Serialize)]
pub struct SignupName(String);

impl SignupName {
    pub fn parse(name: String) -> Result<SignupName, SignupValidationError> {
        let name = name.trim().to_string();

        if name.is_empty() {
            return Err(SignupValidationError::MissingField("name"));
        }

        let is_too_long = name.graphemes(true).count() > MAX_CHAR_LENGHT;
        let contains_forbidden_chars = name.chars().any(|char| FORBIDDEN_CHARS.contains(&char));

        if is_too_long || contains_forbidden_chars {
            return Err(SignupValidationError::InvalidName);
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for SignupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

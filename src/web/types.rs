//! Structs received and sent by the `web` module, their parsing implementations and tests for those.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use validator::ValidateEmail;

use crate::config::EmailPolicy;

/// Upper bound for any stored address, well below what the primary key index can hold.
pub const MAX_EMAIL_BYTES: usize = 320;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Subscriber
/// A Subscriber that can be Deserialized but can have a missing or invalid email.
#[derive(Debug, Deserialize)]
pub struct DeserSubscriber {
    #[serde(default)]
    pub email: Option<String>,
}

impl DeserSubscriber {
    /// Validates the subscriber according to the provided `EmailPolicy`.
    pub fn validate(self, policy: EmailPolicy) -> Result<ValidSubscriber, DataParsingError> {
        let email = self.email.ok_or(DataParsingError::EmailMissing)?;
        let email = match policy {
            EmailPolicy::Minimal => SubscriberEmail::parse(email)?,
            EmailPolicy::Strict => SubscriberEmail::parse_strict(email)?,
        };

        Ok(ValidSubscriber { email })
    }
}

/// Validated Subscriber
#[derive(Debug, Clone)]
pub struct ValidSubscriber {
    pub email: SubscriberEmail,
}

/// Validated Subscriber Email, stored exactly as it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SubscriberEmail {
    /// Accepts anything that contains an '@', up to `MAX_EMAIL_BYTES` and without NUL bytes.
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(DataParsingError::EmailMissing);
        }
        if !value.contains('@') || value.contains('\0') {
            return Err(DataParsingError::EmailInvalid);
        }
        if value.len() > MAX_EMAIL_BYTES {
            return Err(DataParsingError::EmailTooLong);
        }

        Ok(SubscriberEmail(value.to_owned()))
    }

    /// Like `parse` but also enforces a length limit and the email syntax.
    pub fn parse_strict<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let email = Self::parse(value)?;

        if email.0.graphemes(true).count() > 256 {
            return Err(DataParsingError::EmailTooLong);
        }
        if !email.0.validate_email() {
            return Err(DataParsingError::EmailInvalid);
        }

        Ok(email)
    }
}

/// Body of a successful `/api/subscribe` response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribeResponse {
    pub success: bool,
}

impl SubscribeResponse {
    pub fn accepted() -> Self {
        Self { success: true }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
    #[error("email too long")]
    EmailTooLong,
}

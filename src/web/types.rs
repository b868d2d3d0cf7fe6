//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use lazy_regex::regex_is_match;
use serde::Serialize;
use serde_json::Value;

/// Longest address accepted, in characters.
pub const EMAIL_MAX_LEN: usize = 254;

// ###################################
// ->   STRUCTS
// ###################################
/// Validated subscriber email: trimmed, lowercased, `local@domain.tld` shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValidEmail {
    /// Normalizes (trim + lowercase) and validates an email address.
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref().trim().to_lowercase();

        if value.is_empty() {
            return Err(DataParsingError::EmailMissing);
        }
        if value.chars().count() > EMAIL_MAX_LEN {
            return Err(DataParsingError::EmailTooLong);
        }
        if !Self::has_valid_shape(&value) {
            return Err(DataParsingError::EmailInvalid);
        }

        Ok(ValidEmail(value))
    }

    /// The shape check shared with the submission controller:
    /// `x@y.z` where no part contains whitespace or another `@`.
    pub fn has_valid_shape(value: &str) -> bool {
        regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value)
    }
}

/// The fields of a subscribe request body the guard cares about.
#[derive(Debug, Clone, Default)]
pub struct SubscribeRequest {
    pub email: Option<Value>,
    pub website: Option<Value>,
}

impl SubscribeRequest {
    /// Parses the request body. Accepts a JSON object, or a JSON string that itself encodes an object.
    /// Returns the request together with the parsed value, so its serialized size can be checked.
    pub fn from_body(body: &[u8]) -> Result<(Self, Value), DataParsingError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|er| DataParsingError::MalformedBody(er.to_string()))?;

        let value = match value {
            Value::String(inner) => serde_json::from_str(&inner)
                .map_err(|er| DataParsingError::MalformedBody(er.to_string()))?,
            other => other,
        };

        let Value::Object(fields) = &value else {
            return Err(DataParsingError::MalformedBody(
                "expected a JSON object".to_string(),
            ));
        };

        let request = SubscribeRequest {
            email: fields.get("email").cloned(),
            website: fields.get("website").cloned(),
        };

        Ok((request, value))
    }

    /// Extracts and validates the email. Absent, `null` and blank values are "missing",
    /// anything else that doesn't parse is "invalid".
    pub fn valid_email(&self) -> Result<ValidEmail, DataParsingError> {
        match &self.email {
            None | Some(Value::Null) => Err(DataParsingError::EmailMissing),
            Some(Value::String(email)) => ValidEmail::parse(email),
            Some(_) => Err(DataParsingError::EmailInvalid),
        }
    }

    /// The honeypot counts as filled when it holds anything but `null` or a blank string.
    pub fn honeypot_filled(&self) -> bool {
        match &self.website {
            None | Some(Value::Null) => false,
            Some(Value::String(website)) => !website.trim().is_empty(),
            Some(_) => true,
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
    #[error("email too long")]
    EmailTooLong,

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

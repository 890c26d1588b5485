//! Outbound patient creation payload.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Where the upstream secret key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Every caller passes `secretKey` as a tool argument.
    Caller,
    /// The server holds the secret; caller-supplied values are ignored.
    Configured(String),
}

impl SecretSource {
    /// Builds the policy from an optional configured secret.
    #[must_use]
    pub fn from_configured(secret: Option<&str>) -> Self {
        match secret {
            Some(s) if !s.is_empty() => Self::Configured(s.to_string()),
            _ => Self::Caller,
        }
    }

    /// Returns true if callers must supply `secretKey`.
    #[must_use]
    pub const fn requires_caller_secret(&self) -> bool {
        matches!(self, Self::Caller)
    }
}

impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("Caller"),
            Self::Configured(_) => f.write_str("Configured(<redacted>)"),
        }
    }
}

/// The JSON body sent to the upstream patient creation endpoint.
///
/// Absent optional fields are left out of the payload entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCreationRequest {
    /// Patient name.
    pub name: String,
    /// Patient phone number.
    pub phone: String,
    /// Upstream authentication secret.
    pub secret_key: String,
    /// Patient email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Patient date of birth, passed through as given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

impl PatientCreationRequest {
    /// Builds a request from `create_patient` tool arguments.
    ///
    /// Values are kept verbatim. Empty or non-string optional fields are
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first missing required argument.
    pub fn from_arguments(arguments: &Value, secret: &SecretSource) -> Result<Self, String> {
        let name = required_str(arguments, "name")?;
        let phone = required_str(arguments, "phone")?;

        let secret_key = match secret {
            SecretSource::Configured(key) => key.clone(),
            SecretSource::Caller => required_str(arguments, "secretKey")?,
        };

        Ok(Self {
            name,
            phone,
            secret_key,
            email: optional_str(arguments, "email"),
            date_of_birth: optional_str(arguments, "dateOfBirth"),
        })
    }
}

fn required_str(arguments: &Value, key: &str) -> Result<String, String> {
    optional_str(arguments, key).ok_or_else(|| format!("Missing required parameter: {key}"))
}

fn optional_str(arguments: &Value, key: &str) -> Option<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

//! Forwards patient creation calls to the upstream clinic API.
//!
//! Every call ends in a [`ForwardOutcome`]; nothing is propagated as an
//! error. The outcome's `Display` is the exact text returned to MCP clients.

use std::error::Error as _;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clinic::request::{PatientCreationRequest, SecretSource};
use crate::config::UpstreamConfig;
use crate::error::ServerError;

/// Result of one upstream call, before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Upstream answered with a 2xx status.
    Created {
        /// Raw response body.
        body: String,
    },
    /// Upstream answered with a non-2xx status.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The call did not produce a usable HTTP response.
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl ForwardOutcome {
    /// Returns true for [`ForwardOutcome::Created`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

impl fmt::Display for ForwardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { body } => write!(f, "Successfully created patient: {body}"),
            Self::Rejected { status, body } => {
                write!(f, "Failed to create patient. Status: {status}, Error: {body}")
            }
            Self::Failed { message } => write!(f, "An error occurred: {message}"),
        }
    }
}

/// Builds the HTTP client used for upstream calls.
///
/// Redirects are not followed: a 3xx answer is reported as a rejection, and
/// each call is exactly one POST.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed.
pub fn upstream_client(timeout: Duration) -> Result<reqwest::Client, ServerError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(ServerError::HttpClient)
}

/// Sends patient creation requests to a single upstream URL.
///
/// Holds one pooled `reqwest::Client`; clones share the pool.
#[derive(Debug, Clone)]
pub struct PatientForwarder {
    client: reqwest::Client,
    url: String,
    secret: SecretSource,
}

impl PatientForwarder {
    /// Builds a forwarder and its HTTP client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ServerError> {
        let client = upstream_client(Duration::from_secs(config.timeout_secs))?;

        Ok(Self::with_client(
            client,
            config.url.clone(),
            SecretSource::from_configured(config.secret()),
        ))
    }

    /// Builds a forwarder around an existing client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        secret: SecretSource,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            secret,
        }
    }

    /// Returns the secret key policy.
    #[must_use]
    pub const fn secret_source(&self) -> &SecretSource {
        &self.secret
    }

    /// POSTs the request as JSON and classifies the response.
    pub async fn forward(&self, request: &PatientCreationRequest) -> ForwardOutcome {
        debug!(upstream = %self.url, "Sending create-patient request");

        let response = match self.client.post(&self.url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe_error(&e);
                warn!(error = %message, "Upstream request failed");
                return ForwardOutcome::Failed { message };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let message = describe_error(&e);
                warn!(status = status.as_u16(), error = %message, "Failed to read upstream response");
                return ForwardOutcome::Failed { message };
            }
        };

        if status.is_success() {
            info!(status = status.as_u16(), "Patient created upstream");
            ForwardOutcome::Created { body }
        } else {
            warn!(status = status.as_u16(), "Upstream rejected patient creation");
            ForwardOutcome::Rejected {
                status: status.as_u16(),
                body,
            }
        }
    }
}

/// Renders an error with its source chain, e.g.
/// `error sending request for url (...): client error (Connect): ...`.
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_format() {
        let outcome = ForwardOutcome::Created {
            body: "patient-123".to_string(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.to_string(), "Successfully created patient: patient-123");
    }

    #[test]
    fn rejected_format() {
        let outcome = ForwardOutcome::Rejected {
            status: 400,
            body: "invalid phone".to_string(),
        };
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.to_string(),
            "Failed to create patient. Status: 400, Error: invalid phone"
        );
    }

    #[test]
    fn failed_format() {
        let outcome = ForwardOutcome::Failed {
            message: "connection refused".to_string(),
        };
        assert_eq!(outcome.to_string(), "An error occurred: connection refused");
    }

    #[test]
    fn new_uses_configured_secret() {
        let config = UpstreamConfig {
            secret_key: Some("server-secret".to_string()),
            timeout_secs: 2,
            ..UpstreamConfig::default()
        };
        let forwarder = PatientForwarder::new(&config).unwrap();
        assert_eq!(
            forwarder.secret_source(),
            &SecretSource::Configured("server-secret".to_string())
        );
    }
}

//! Clinic system integration.
//!
//! The server does not store patients. It builds a
//! [`PatientCreationRequest`] from tool arguments and hands it to the
//! upstream clinic API through [`PatientForwarder`], which reports the
//! result as a [`ForwardOutcome`].

pub mod forwarder;
pub mod request;

pub use forwarder::{upstream_client, ForwardOutcome, PatientForwarder};
pub use request::{PatientCreationRequest, SecretSource};

//! Vision Layer
//!
//! Reads the gauge value out of a frame region by sending it to a remote
//! vision-language endpoint and extracting the numeric reading from the
//! free-form response text.

pub mod client;
pub mod parse;

use thiserror::Error;

pub use client::{OpenAiVision, VisionBackend};
pub use parse::{parse_reading, ParsedReading};

/// Errors from the remote inference call.
///
/// All of these are non-fatal per reading; the periodic schedule itself is
/// the retry mechanism.
#[derive(Debug, Error)]
pub enum VisionError {
    /// No API credential configured; the call is never attempted
    #[error("API key not set")]
    MissingCredential,
    /// The request could not be sent or the response not received
    #[error("request failed: {0}")]
    Network(String),
    /// The service answered, but not with a usable completion
    #[error("service error: {0}")]
    Service(String),
}

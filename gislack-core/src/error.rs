//! Error taxonomy shared by the submission pipeline, the single-service clients and the
//! authorization flow. Nothing in this crate terminates the process; every failure travels
//! back to the CLI boundary as one of these values.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::Service;

/// A request could not be built: a local file was unreadable or a required option was missing.
#[derive(Error, Debug)]
#[error("build failed: {reason}")]
pub struct BuildError {
    pub reason: String,
    #[source]
    pub source: Option<std::io::Error>,
}

impl BuildError {
    pub fn missing(reason: impl Into<String>) -> Self {
        BuildError {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn unreadable(path: PathBuf, source: std::io::Error) -> Self {
        BuildError {
            reason: format!("cannot read {}: {source}", path.display()),
            source: Some(source),
        }
    }
}

/// A single request's network call failed, timed out or was answered with a non-2xx status.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Failed { url: String, message: String },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

/// One slot of a dual submission that produced no response.
#[derive(Debug)]
pub struct SlotFailure {
    pub service: Service,
    pub error: TransportError,
}

/// Failures of a dual submission, in pipeline order.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    BuildFailed(#[from] BuildError),

    #[error(
        "partial dispatch failure: collected {collected} of 2 responses ({})",
        describe_failures(.failures)
    )]
    PartialDispatchFailure {
        collected: usize,
        failures: Vec<SlotFailure>,
    },

    #[error("correlation unavailable: {0}")]
    CorrelationUnavailable(String),

    #[error("{service} response could not be decoded: {source}")]
    MalformedResponse {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} rejected the submission: {message}")]
    ServiceRejected { service: Service, message: String },

    #[error("preparing the submission failed: {0}")]
    Prepare(#[from] ClientError),
}

fn describe_failures(failures: &[SlotFailure]) -> String {
    if failures.is_empty() {
        return "no transport error recorded".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.service, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures of single-service Gist and Slack calls.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    BuildFailed(#[from] BuildError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("slack answered with an error: {0}")]
    Slack(String),

    #[error("no channel ID for {0}")]
    ChannelNotFound(String),

    #[error("no channels")]
    NoChannels,
}

impl ClientError {
    pub fn decode(what: &'static str) -> impl FnOnce(serde_json::Error) -> ClientError {
        move |source| ClientError::Decode { what, source }
    }
}

/// Failures of the OAuth authorization flow.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("cannot listen for the redirect on port {port}: {source}")]
    Listen {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no redirect arrived within {0:?}")]
    CallbackTimeout(Duration),

    #[error("redirect could not be read: {0}")]
    Callback(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("token response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("[ {0} ] - Code is wrong.")]
    Rejected(String),
}

/// Failures reading or writing the persisted configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error of '{}': {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

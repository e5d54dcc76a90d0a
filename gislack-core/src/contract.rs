#![allow(unused)]

//! # contract: the seams between gislack's pipeline and the outside world
//!
//! This module defines the traits every networked collaborator implements:
//!
//! - [`Transport`]: performs one [`RequestDescriptor`] and returns the raw reply.
//! - [`GistApi`]: the Gist client (list, get, create, update, delete).
//! - [`SlackApi`]: the chat client (identity, channels, resolution, upload, files, history).
//! - [`Authorizer`]: obtains an access token for either service.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall` so tests can script replies without a network.
//! - Mocks are exported under the `test-export-mocks` feature for the CLI crate's tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use mockall::{automock, predicate::*};

use crate::config::AccessToken;
use crate::error::{AuthError, ClientError, TransportError};
use crate::models::{
    Channel, Gist, Message, Service, SlackFile, SlackFileInfo, SlackFileResponse, SlackIdentity,
};
use crate::request::{GistDraft, RequestDescriptor, SlackUpload};

/// What came back from a successful request: lower-cased header names and the raw body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        Reply {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Executes one request. No retries: a failure is reported once and left to the caller.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Reply, TransportError>;
}

/// Single-service Gist operations.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GistApi: Send + Sync {
    /// All gists of the authenticated user.
    async fn list(&self) -> Result<Vec<Gist>, ClientError>;

    /// One gist, or one revision of it when `id` is `{id}/{sha}`.
    async fn get(&self, id: &str) -> Result<Gist, ClientError>;

    async fn create(&self, draft: &GistDraft, workdir: &Path) -> Result<Gist, ClientError>;

    /// With `overwrite`, files of the gist that are not in `draft` are deleted.
    async fn update(
        &self,
        id: &str,
        draft: &GistDraft,
        overwrite: bool,
        workdir: &Path,
    ) -> Result<Gist, ClientError>;

    /// Returns the response body, which is empty on success.
    async fn delete(&self, id: &str) -> Result<String, ClientError>;
}

/// Single-service Slack operations.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Team and user the token belongs to.
    async fn identity(&self) -> Result<SlackIdentity, ClientError>;

    async fn channels(&self) -> Result<Vec<Channel>, ClientError>;

    /// Channel name (or ID) to channel ID.
    async fn resolve_channel(&self, name: &str) -> Result<String, ClientError>;

    async fn upload(
        &self,
        upload: &SlackUpload,
        workdir: &Path,
    ) -> Result<SlackFileResponse, ClientError>;

    /// Every page of `files.list`, optionally filtered by channel ID and user ID.
    async fn files(
        &self,
        channel_id: Option<String>,
        user: Option<String>,
    ) -> Result<Vec<SlackFile>, ClientError>;

    async fn file_info(&self, file_id: &str) -> Result<SlackFileInfo, ClientError>;

    /// `Ok(false)` when Slack reports the file as already gone.
    async fn delete_file(&self, file_id: &str) -> Result<bool, ClientError>;

    /// Every message of a channel, newest first.
    async fn history(&self, channel_id: &str) -> Result<Vec<Message>, ClientError>;

    async fn delete_message(&self, channel_id: &str, ts: &str) -> Result<(), ClientError>;
}

/// Runs an OAuth authorization flow for one service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// The whole flow: authorization URL, redirect, code exchange.
    async fn obtain_token(
        &self,
        service: Service,
        client_id: &str,
        client_secret: &str,
        port: u16,
    ) -> Result<AccessToken, AuthError>;

    /// Trades an authorization code the user already holds for an access token.
    async fn exchange_code(
        &self,
        service: Service,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<AccessToken, AuthError>;
}

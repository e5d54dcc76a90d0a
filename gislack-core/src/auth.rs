//! # auth: obtaining access tokens for Gist and Slack
//!
//! The flow opens the authorization URL in the user's browser (printing it when no browser
//! can be launched), waits for the provider to redirect to a one-shot listener on
//! `127.0.0.1:{port}`, and trades the `code` from that redirect for an access token.
//!
//! - [`authorize_url`] builds the URL the user has to open.
//! - [`wait_for_code`] serves exactly one redirect request.
//! - [`Authorizer::exchange_code`](crate::contract::Authorizer::exchange_code) performs the token request.
//! - [`check_gist_token`] reads the Gist API rate limit for the configured client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::{AccessToken, GistAccessToken, SlackAccessToken};
use crate::contract::{Authorizer, Transport};
use crate::error::AuthError;
use crate::models::{unix_to_local, Service};
use crate::render::display_time;
use crate::request::{endpoint, slack_method, RequestBody, RequestDescriptor};

pub const DEFAULT_PORT: u16 = 8080;
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

pub const GIST_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const GIST_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const GIST_RATE_LIMIT_URL: &str = "https://api.github.com/rate_limit";
pub const SLACK_AUTHORIZE_URL: &str = "https://slack.com/oauth/authorize";

pub const GIST_SCOPES: &[&str] = &["gist", "repo"];
pub const SLACK_SCOPES: &[&str] = &[
    "channels:history",
    "channels:read",
    "chat:write:user",
    "files:read",
    "files:write:user",
];

const CALLBACK_PAGE: &str = "<html><body><p>gislack received the authorization code. \
You can close this page.</p></body></html>";

/// The URL a user opens to grant gislack access to `service`.
pub fn authorize_url(service: Service, client_id: &str) -> Result<String, AuthError> {
    let (base, scopes) = match service {
        Service::Gist => (GIST_AUTHORIZE_URL, GIST_SCOPES),
        Service::Slack => (SLACK_AUTHORIZE_URL, SLACK_SCOPES),
    };
    let scope = scopes.join(" ");
    endpoint(base, &[("client_id", client_id), ("scope", &scope)])
        .map_err(|e| AuthError::Callback(e.reason))
}

/// Opens a URL for the user, normally in the default browser.
pub type Launcher = Box<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

/// Hands `url` to `launch`, falling back to printing it on stderr. Returns whether it launched.
pub fn present_authorize_url(url: &str, launch: &Launcher) -> bool {
    match launch(url) {
        Ok(()) => {
            info!(url, "Opened the authorization page in the browser");
            true
        }
        Err(e) => {
            warn!(error = %e, "Could not launch a browser");
            eprintln!("Open this URL in your browser and authorize gislack:\n{url}");
            false
        }
    }
}

/// Extracts `code` from an HTTP request line such as `GET /?code=abc&state=x HTTP/1.1`.
pub fn parse_callback_request(request_line: &str) -> Result<String, AuthError> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::Callback(format!("unexpected request: {request_line:?}")))?;
    let url = reqwest::Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map_err(|e| AuthError::Callback(e.to_string()))?;
    let mut code = None;
    let mut denied = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "error" => denied = Some(value.into_owned()),
            _ => {}
        }
    }
    match (code, denied) {
        (Some(code), _) => Ok(code),
        (None, Some(reason)) => Err(AuthError::Rejected(reason)),
        (None, None) => Err(AuthError::Callback(format!(
            "no code in redirect {target:?}"
        ))),
    }
}

/// Serves one redirect on `listener` and returns its authorization code.
pub async fn wait_for_code(listener: TcpListener, timeout: Duration) -> Result<String, AuthError> {
    let serve = async {
        let (mut stream, peer) = listener
            .accept()
            .await
            .map_err(|e| AuthError::Callback(e.to_string()))?;
        debug!(peer = %peer, "Redirect connection accepted");
        let (read_half, mut write_half) = stream.split();
        let mut reader = BufReader::new(read_half);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::Callback(e.to_string()))?;
        let code = parse_callback_request(request_line.trim_end());
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            CALLBACK_PAGE.len(),
            CALLBACK_PAGE
        );
        // The code is still usable when the browser has already gone away.
        if let Err(e) = write_half.write_all(response.as_bytes()).await {
            debug!(error = %e, "Could not answer the redirect");
        }
        let _ = write_half.shutdown().await;
        code
    };
    match tokio::time::timeout(timeout, serve).await {
        Ok(result) => result,
        Err(_) => {
            error!(timeout = ?timeout, "No redirect arrived");
            Err(AuthError::CallbackTimeout(timeout))
        }
    }
}

#[derive(Debug, Deserialize)]
struct GistTokenReply {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Runs the browser-redirect flow against the real providers.
pub struct OAuthAuthorizer<T> {
    transport: T,
    timeout: Duration,
    launch: Launcher,
}

impl<T: Transport> OAuthAuthorizer<T> {
    pub fn new(transport: T) -> Self {
        OAuthAuthorizer {
            transport,
            timeout: CALLBACK_TIMEOUT,
            launch: Box::new(|url: &str| webbrowser::open(url)),
        }
    }

    pub fn with_launcher(
        mut self,
        launch: impl Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.launch = Box::new(launch);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl<T: Transport> Authorizer for OAuthAuthorizer<T> {
    async fn obtain_token(
        &self,
        service: Service,
        client_id: &str,
        client_secret: &str,
        port: u16,
    ) -> Result<AccessToken, AuthError> {
        let url = authorize_url(service, client_id)?;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| AuthError::Listen { port, source })?;
        present_authorize_url(&url, &self.launch);
        info!(service = %service, port, "Waiting for the authorization redirect");
        let code = wait_for_code(listener, self.timeout).await?;
        self.exchange_code(service, client_id, client_secret, &code)
            .await
    }

    async fn exchange_code(
        &self,
        service: Service,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<AccessToken, AuthError> {
        info!(service = %service, "Exchanging authorization code");
        match service {
            Service::Gist => {
                let form = vec![
                    ("client_id".to_string(), client_id.to_string()),
                    ("client_secret".to_string(), client_secret.to_string()),
                    ("code".to_string(), code.to_string()),
                ];
                let request = RequestDescriptor::new(Method::POST, GIST_TOKEN_URL)
                    .with_accept("application/json")
                    .with_body(RequestBody::Form(form));
                let reply = self.transport.execute(&request).await?;
                let token: GistTokenReply = serde_json::from_slice(&reply.body)?;
                if let Some(err) = token.error.filter(|e| !e.is_empty()) {
                    let reason = token.error_description.unwrap_or(err);
                    error!(service = %service, reason = %reason, "Token exchange rejected");
                    return Err(AuthError::Rejected(reason));
                }
                Ok(AccessToken::Gist(GistAccessToken {
                    access_token: token.access_token,
                    token_type: token.token_type,
                    scope: token.scope,
                }))
            }
            Service::Slack => {
                let url = endpoint(
                    &slack_method("oauth.access"),
                    &[
                        ("client_id", client_id),
                        ("client_secret", client_secret),
                        ("code", code),
                    ],
                )
                .map_err(|e| AuthError::Callback(e.reason))?;
                let reply = self
                    .transport
                    .execute(&RequestDescriptor::new(Method::GET, url))
                    .await?;
                let token: SlackAccessToken = serde_json::from_slice(&reply.body)?;
                let failed = token.ok == Some(false) || token.error.is_some();
                if failed {
                    let reason = token.error.unwrap_or_else(|| "ok was false".to_string());
                    error!(service = %service, reason = %reason, "Token exchange rejected");
                    return Err(AuthError::Rejected(reason));
                }
                Ok(AccessToken::Slack(token))
            }
        }
    }
}

/// Rate-limit headers of the Gist API, as printed by `auth --chkgisttoken`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimit {
    #[serde(rename = "MaxLimit")]
    pub max_limit: String,
    #[serde(rename = "Remaining")]
    pub remaining: String,
    #[serde(rename = "ResetTime")]
    pub reset_time: String,
}

pub async fn check_gist_token<T: Transport + ?Sized>(
    transport: &T,
    client_id: &str,
    client_secret: &str,
) -> Result<RateLimit, AuthError> {
    let url = endpoint(
        GIST_RATE_LIMIT_URL,
        &[("client_id", client_id), ("client_secret", client_secret)],
    )
    .map_err(|e| AuthError::Callback(e.reason))?;
    let reply = transport
        .execute(&RequestDescriptor::new(Method::GET, url))
        .await?;
    let header = |name: &str| reply.header(name).unwrap_or_default().to_string();
    let reset = reply
        .header("x-ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(unix_to_local);
    Ok(RateLimit {
        max_limit: header("x-ratelimit-limit"),
        remaining: header("x-ratelimit-remaining"),
        reset_time: display_time(reset.as_ref()),
    })
}

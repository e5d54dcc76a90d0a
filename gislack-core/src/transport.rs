//! reqwest-backed [`Transport`]. Each request is sent with the timeout its descriptor carries;
//! non-2xx statuses are reported as [`TransportError::Status`] with the body text.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};

use crate::contract::{Reply, Transport};
use crate::error::TransportError;
use crate::request::{RequestBody, RequestDescriptor};

const USER_AGENT: &str = concat!("gislack/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Failed {
                url: String::new(),
                message: format!("cannot build HTTP client: {e}"),
            })?;
        tracing::debug!(user_agent = USER_AGENT, "Initialized HTTP transport");
        Ok(HttpTransport { client })
    }

    fn prepare(&self, request: &RequestDescriptor) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .timeout(request.timeout());
        if let Some(token) = request.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(accept) = request.accept() {
            builder = builder.header(ACCEPT, accept);
        }
        match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(bytes.clone()),
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Multipart { fields, file } => {
                let form = fields
                    .iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k.clone(), v.clone()))
                    .part(
                        file.field.clone(),
                        Part::bytes(file.bytes.clone()).file_name(file.file_name.clone()),
                    );
                builder.multipart(form)
            }
        }
    }
}

fn classify(url: &str, request: &RequestDescriptor, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            timeout: request.timeout(),
        }
    } else {
        TransportError::Failed {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<Reply, TransportError> {
        let url = request.url();
        tracing::info!(method = %request.method(), url, "Sending request");

        let response = self
            .prepare(request)
            .send()
            .await
            .map_err(|e| classify(url, request, e))?;

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(url, request, e))?
            .to_vec();

        if !status.is_success() {
            tracing::error!(url, status = status.as_u16(), "Request answered with error status");
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        tracing::info!(url, status = status.as_u16(), bytes = body.len(), "Request succeeded");
        Ok(Reply { headers, body })
    }
}

//! # Request Builder
//!
//! Turns validated options into [`RequestDescriptor`]s without touching the network. Every
//! descriptor carries the same fixed [`REQUEST_TIMEOUT`], so neither half of a dual
//! submission can stall the job longer than the other.
//!
//! - [`gist_create_request`] / [`gist_update_request`]: JSON payload
//!   `{description, public, files: {name: {content}}}`.
//! - [`slack_upload_request`]: multipart form with `token, channels, title, filetype,
//!   initial_comment, filename` plus the file, or a form-encoded body for inline content.
//! - [`DualSubmissionJob::build`]: both of the above from a single [`DoubleSubmitOptions`].
//!
//! File paths with no directory component are read relative to the working directory handed
//! in by the caller; anything else is used as given.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use reqwest::{Method, Url};
use serde_json::{json, Map, Value};

use crate::error::BuildError;
use crate::options::{Credentials, DoubleSubmitOptions, SubmitMode};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const GIST_API_URL: &str = "https://api.github.com/gists";
pub const SLACK_API_URL: &str = "https://slack.com/api/";

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One outbound request, fully described. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    body: RequestBody,
    bearer_token: Option<String>,
    accept: Option<String>,
    timeout: Duration,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        RequestDescriptor {
            method,
            url: url.into(),
            body: RequestBody::Empty,
            bearer_token: None,
            accept: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// An empty token means "send no Authorization header".
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer_token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    /// Replaces the fixed [`REQUEST_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    pub fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Multipart boundaries are chosen by the transport, so only the media type is known here.
    pub fn content_type(&self) -> Option<&'static str> {
        match self.body {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some("application/json"),
            RequestBody::Form(_) => Some("application/x-www-form-urlencoded"),
            RequestBody::Multipart { .. } => Some("multipart/form-data"),
        }
    }
}

/// Appends URL-encoded query parameters to `base`.
pub fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<String, BuildError> {
    let url = Url::parse_with_params(base, params)
        .map_err(|e| BuildError::missing(format!("invalid url {base}: {e}")))?;
    Ok(url.to_string())
}

pub fn slack_method(name: &str) -> String {
    format!("{SLACK_API_URL}{name}")
}

/// Paths without a directory part are taken relative to `workdir`.
pub fn resolve_path(workdir: &Path, file: &Path) -> PathBuf {
    match file.parent() {
        None => workdir.join(file),
        Some(dir) if dir.as_os_str().is_empty() || dir == Path::new(".") => workdir.join(file),
        Some(_) => file.to_path_buf(),
    }
}

pub fn base_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string_lossy().into_owned())
}

fn read_file(workdir: &Path, file: &Path) -> Result<Vec<u8>, BuildError> {
    let path = resolve_path(workdir, file);
    std::fs::read(&path).map_err(|e| {
        tracing::error!(error = ?e, path = %path.display(), "Failed to read file for submission");
        BuildError::unreadable(path, e)
    })
}

/// A local file destined for a gist, optionally under a different name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistFile {
    pub path: PathBuf,
    pub name: Option<String>,
}

impl GistFile {
    pub fn gist_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| base_name(&self.path))
    }
}

/// Description, visibility and files of a gist to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GistDraft {
    pub description: String,
    pub public: bool,
    pub files: Vec<GistFile>,
}

fn gist_files(draft: &GistDraft, workdir: &Path) -> Result<Map<String, Value>, BuildError> {
    let mut files = Map::new();
    for file in &draft.files {
        let content = read_file(workdir, &file.path)?;
        let mut entry = json!({ "content": String::from_utf8_lossy(&content) });
        if let Some(name) = &file.name {
            entry["filename"] = Value::String(name.clone());
        }
        files.insert(file.gist_name(), entry);
    }
    Ok(files)
}

fn gist_payload(draft: &GistDraft, files: Map<String, Value>) -> Result<Vec<u8>, BuildError> {
    let mut payload = Map::new();
    if !draft.description.is_empty() {
        payload.insert("description".into(), Value::String(draft.description.clone()));
    }
    payload.insert("public".into(), Value::Bool(draft.public));
    payload.insert("files".into(), Value::Object(files));
    serde_json::to_vec(&payload)
        .map_err(|e| BuildError::missing(format!("cannot encode gist payload: {e}")))
}

/// POST `/gists`. An empty token builds an anonymous request.
pub fn gist_create_request(
    draft: &GistDraft,
    token: &str,
    workdir: &Path,
) -> Result<RequestDescriptor, BuildError> {
    if draft.files.is_empty() {
        return Err(BuildError::missing("at least one file is required for a gist"));
    }
    let files = gist_files(draft, workdir)?;
    let body = gist_payload(draft, files)?;
    Ok(RequestDescriptor::new(Method::POST, GIST_API_URL)
        .with_body(RequestBody::Json(body))
        .with_bearer(token))
}

/// PATCH `/gists/{id}`. Every name in `remove` that is not being uploaded is sent as `null`,
/// which deletes that file from the gist.
pub fn gist_update_request(
    gist_id: &str,
    draft: &GistDraft,
    remove: &[String],
    token: &str,
    workdir: &Path,
) -> Result<RequestDescriptor, BuildError> {
    let mut files = gist_files(draft, workdir)?;
    for name in remove {
        if !files.contains_key(name) {
            files.insert(name.clone(), Value::Null);
        }
    }
    let body = gist_payload(draft, files)?;
    Ok(
        RequestDescriptor::new(Method::PATCH, format!("{GIST_API_URL}/{gist_id}"))
            .with_body(RequestBody::Json(body))
            .with_bearer(token),
    )
}

/// What a Slack upload carries: a local file, or inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    File(PathBuf),
    Content(String),
}

/// A Slack `files.upload` call with the channel already resolved to its ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackUpload {
    pub channel_id: String,
    pub title: String,
    pub filetype: String,
    pub initial_comment: String,
    pub source: UploadSource,
}

pub fn slack_upload_request(
    upload: &SlackUpload,
    token: &str,
    workdir: &Path,
) -> Result<RequestDescriptor, BuildError> {
    let mut fields = vec![
        ("token".to_string(), token.to_string()),
        ("channels".to_string(), upload.channel_id.clone()),
        ("title".to_string(), upload.title.clone()),
        ("filetype".to_string(), upload.filetype.clone()),
        ("initial_comment".to_string(), upload.initial_comment.clone()),
    ];
    let body = match &upload.source {
        UploadSource::File(path) => {
            let bytes = read_file(workdir, path)?;
            let file_name = base_name(path);
            fields.push(("filename".to_string(), file_name.clone()));
            RequestBody::Multipart {
                fields,
                file: FilePart {
                    field: "file".to_string(),
                    file_name,
                    bytes,
                },
            }
        }
        UploadSource::Content(content) => {
            fields.push(("content".to_string(), content.clone()));
            RequestBody::Form(fields)
        }
    };
    Ok(RequestDescriptor::new(Method::POST, slack_method("files.upload"))
        .with_body(body)
        .with_bearer(token))
}

/// The two requests of one dual submission plus the time the job started.
#[derive(Debug, Clone)]
pub struct DualSubmissionJob {
    gist: RequestDescriptor,
    slack: RequestDescriptor,
    started: Instant,
}

impl DualSubmissionJob {
    /// `channel_id` is the already-resolved Slack channel; `existing_gist_files` is only read
    /// for [`SubmitMode::UpdateOverwrite`].
    pub fn build(
        opts: &DoubleSubmitOptions,
        credentials: &Credentials,
        channel_id: &str,
        existing_gist_files: &[String],
        workdir: &Path,
        started: Instant,
    ) -> Result<Self, BuildError> {
        let draft = GistDraft {
            description: opts.title.clone(),
            public: opts.public,
            files: vec![GistFile {
                path: opts.file.clone(),
                name: opts.filename.clone(),
            }],
        };
        let gist = match &opts.mode {
            SubmitMode::Create => gist_create_request(&draft, &credentials.gist_token, workdir)?,
            SubmitMode::UpdateOverwrite(id) => gist_update_request(
                id,
                &draft,
                existing_gist_files,
                &credentials.gist_token,
                workdir,
            )?,
            SubmitMode::UpdateAdd(id) => {
                gist_update_request(id, &draft, &[], &credentials.gist_token, workdir)?
            }
        };

        let upload = SlackUpload {
            channel_id: channel_id.to_string(),
            title: opts.title.clone(),
            filetype: opts.filetype.clone(),
            initial_comment: opts.initial_comment.clone(),
            source: UploadSource::File(opts.file.clone()),
        };
        let slack = slack_upload_request(&upload, &credentials.slack_token, workdir)?;

        tracing::debug!(
            gist_url = gist.url(),
            slack_url = slack.url(),
            "Built dual submission requests"
        );
        Ok(DualSubmissionJob::from_parts(gist, slack, started))
    }

    pub fn from_parts(gist: RequestDescriptor, slack: RequestDescriptor, started: Instant) -> Self {
        DualSubmissionJob {
            gist,
            slack,
            started,
        }
    }

    pub fn gist(&self) -> &RequestDescriptor {
        &self.gist
    }

    pub fn slack(&self) -> &RequestDescriptor {
        &self.slack
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_resolve_against_workdir() {
        let workdir = Path::new("/work");
        assert_eq!(
            resolve_path(workdir, Path::new("a.txt")),
            PathBuf::from("/work/a.txt")
        );
        assert_eq!(
            resolve_path(workdir, Path::new("./a.txt")),
            PathBuf::from("/work/./a.txt")
        );
        assert_eq!(
            resolve_path(workdir, Path::new("sub/a.txt")),
            PathBuf::from("sub/a.txt")
        );
        assert_eq!(
            resolve_path(workdir, Path::new("/abs/a.txt")),
            PathBuf::from("/abs/a.txt")
        );
    }

    #[test]
    fn empty_token_sends_no_authorization() {
        let req = RequestDescriptor::new(Method::GET, GIST_API_URL).with_bearer("");
        assert_eq!(req.bearer_token(), None);
        assert_eq!(req.timeout(), REQUEST_TIMEOUT);
        assert_eq!(req.content_type(), None);
    }

    #[test]
    fn endpoint_encodes_query() {
        let url = endpoint(&slack_method("files.info"), &[("file", "F 1")]).unwrap();
        assert_eq!(url, "https://slack.com/api/files.info?file=F+1");
    }
}

//! Wire types for the Gist and Slack APIs, as decoded from their JSON responses and as
//! re-emitted by the renderer. Timestamps decode straight into local time.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two submission targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Gist,
    Slack,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Gist => f.write_str("gist"),
            Service::Slack => f.write_str("slack"),
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A gist as returned by create, update, get and list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gist {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<GistRevision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<GistOwner>,
}

impl Gist {
    /// Names of the files currently in the gist.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .as_ref()
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistRevision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GistOwner {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login: String,
}

/// Owner login shown for gists that came back without an owner.
pub const ANONYMOUS_OWNER: &str = "### This was submitted as anonymous. ###";

/// Response of `files.upload`. Slack always sets `ok`; Gist never does.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackFileResponse {
    #[serde(default, skip_serializing_if = "is_false")]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub file: SlackFile,
}

/// A file as Slack describes it in upload, list and info responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub created: i64,
    #[serde(default, rename = "createdtime", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<String>,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

impl SlackFile {
    /// Fills `created_time` from the unix `created` field.
    pub fn with_local_time(mut self) -> Self {
        self.created_time = unix_to_local(self.created);
        self
    }
}

pub fn unix_to_local(secs: i64) -> Option<DateTime<Local>> {
    if secs == 0 {
        return None;
    }
    Local.timestamp_opt(secs, 0).single()
}

/// Response of `files.info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlackFileInfo {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub file: SlackFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelList {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

/// One page of `files.list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackFilesPage {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub files: Vec<SlackFile>,
    #[serde(default)]
    pub paging: Paging,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
}

impl Message {
    /// Display name for the author: username when present, else the user ID.
    pub fn author(&self) -> &str {
        if !self.username.is_empty() {
            &self.username
        } else {
            &self.user
        }
    }
}

/// One page of `channels.history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelHistoryPage {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
}

/// Minimal `{ok, error}` envelope shared by Slack write endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackStatus {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// `auth.test`: the team and user a token belongs to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SlackIdentity {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub user: String,
}

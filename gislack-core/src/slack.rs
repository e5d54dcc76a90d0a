//! Slack client: the chat-service calls behind [`SlackApi`], including channel-name
//! resolution for uploads.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, info, warn};

use crate::contract::{SlackApi, Transport};
use crate::error::ClientError;
use crate::models::{
    Channel, ChannelHistoryPage, ChannelList, Message, SlackFile, SlackFileInfo,
    SlackFileResponse, SlackFilesPage, SlackIdentity, SlackStatus,
};
use crate::request::{endpoint, slack_method, slack_upload_request, RequestDescriptor, SlackUpload};

const FILES_PAGE_SIZE: &str = "100";
const HISTORY_PAGE_SIZE: &str = "1000";

pub struct SlackClient<T> {
    transport: T,
    token: String,
}

/// Finds the ID for a channel given by name; an exact ID match is accepted too.
pub fn find_channel_id(channels: &[Channel], name_or_id: &str) -> Option<String> {
    channels
        .iter()
        .find(|c| c.name == name_or_id)
        .or_else(|| channels.iter().find(|c| c.id == name_or_id))
        .map(|c| c.id.clone())
}

impl<T: Transport> SlackClient<T> {
    pub fn new(transport: T, token: impl Into<String>) -> Self {
        SlackClient {
            transport,
            token: token.into(),
        }
    }

    async fn call(&self, method: Method, url: String) -> Result<Vec<u8>, ClientError> {
        let request = RequestDescriptor::new(method, url).with_bearer(&self.token);
        Ok(self.transport.execute(&request).await?.body)
    }
}

fn rejected(error: Option<String>) -> ClientError {
    ClientError::Slack(error.unwrap_or_else(|| "ok was false".to_string()))
}

#[async_trait]
impl<T: Transport> SlackApi for SlackClient<T> {
    async fn identity(&self) -> Result<SlackIdentity, ClientError> {
        let url = endpoint(&slack_method("auth.test"), &[])?;
        let body = self.call(Method::POST, url).await?;
        let identity: SlackIdentity =
            serde_json::from_slice(&body).map_err(ClientError::decode("auth.test response"))?;
        if !identity.ok {
            return Err(rejected(identity.error));
        }
        debug!(team = %identity.team, user = %identity.user, "Checked Slack token");
        Ok(identity)
    }

    async fn channels(&self) -> Result<Vec<Channel>, ClientError> {
        let url = endpoint(&slack_method("channels.list"), &[])?;
        let body = self.call(Method::GET, url).await?;
        let list: ChannelList =
            serde_json::from_slice(&body).map_err(ClientError::decode("channel list"))?;
        if !list.ok && list.error.is_some() {
            return Err(rejected(list.error));
        }
        debug!(count = list.channels.len(), "Fetched channel list");
        Ok(list.channels)
    }

    async fn resolve_channel(&self, name: &str) -> Result<String, ClientError> {
        let channels = self.channels().await?;
        match find_channel_id(&channels, name) {
            Some(id) => {
                info!(channel = name, channel_id = %id, "Resolved channel");
                Ok(id)
            }
            None => {
                warn!(channel = name, "No channel ID for channel name");
                Err(ClientError::ChannelNotFound(name.to_string()))
            }
        }
    }

    async fn upload(
        &self,
        upload: &SlackUpload,
        workdir: &Path,
    ) -> Result<SlackFileResponse, ClientError> {
        let request = slack_upload_request(upload, &self.token, workdir)?;
        let body = self.transport.execute(&request).await?.body;
        let mut response: SlackFileResponse =
            serde_json::from_slice(&body).map_err(ClientError::decode("upload response"))?;
        if !response.ok {
            return Err(rejected(response.error));
        }
        response.file = response.file.with_local_time();
        info!(file_id = %response.file.id, "Uploaded file to Slack");
        Ok(response)
    }

    async fn files(
        &self,
        channel_id: Option<String>,
        user: Option<String>,
    ) -> Result<Vec<SlackFile>, ClientError> {
        let mut files = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_str = page.to_string();
            let mut params = vec![("count", FILES_PAGE_SIZE), ("page", page_str.as_str())];
            if let Some(channel) = channel_id.as_deref() {
                params.push(("channel", channel));
            }
            if let Some(user) = user.as_deref() {
                params.push(("user", user));
            }
            let url = endpoint(&slack_method("files.list"), &params)?;
            let body = self.call(Method::POST, url).await?;
            let listed: SlackFilesPage =
                serde_json::from_slice(&body).map_err(ClientError::decode("file list"))?;
            if !listed.ok && listed.error.is_some() {
                return Err(rejected(listed.error));
            }
            files.extend(listed.files.into_iter().map(SlackFile::with_local_time));
            if listed.paging.pages == 0 || listed.paging.page >= listed.paging.pages {
                break;
            }
            page = listed.paging.page + 1;
        }
        info!(count = files.len(), "Fetched Slack file list");
        Ok(files)
    }

    async fn file_info(&self, file_id: &str) -> Result<SlackFileInfo, ClientError> {
        let url = endpoint(&slack_method("files.info"), &[("file", file_id)])?;
        let body = self.call(Method::POST, url).await?;
        let mut info: SlackFileInfo =
            serde_json::from_slice(&body).map_err(ClientError::decode("file info"))?;
        if !info.ok {
            return Err(rejected(info.error));
        }
        info.file = info.file.with_local_time();
        Ok(info)
    }

    async fn delete_file(&self, file_id: &str) -> Result<bool, ClientError> {
        let url = endpoint(&slack_method("files.delete"), &[("file", file_id)])?;
        let body = self.call(Method::POST, url).await?;
        let status: SlackStatus =
            serde_json::from_slice(&body).map_err(ClientError::decode("delete response"))?;
        info!(file_id, ok = status.ok, "Deleted Slack file");
        Ok(status.ok)
    }

    async fn history(&self, channel_id: &str) -> Result<Vec<Message>, ClientError> {
        let mut messages: Vec<Message> = Vec::new();
        let mut latest = String::new();
        loop {
            let url = endpoint(
                &slack_method("channels.history"),
                &[
                    ("channel", channel_id),
                    ("latest", latest.as_str()),
                    ("count", HISTORY_PAGE_SIZE),
                ],
            )?;
            let body = self.call(Method::POST, url).await?;
            let page: ChannelHistoryPage =
                serde_json::from_slice(&body).map_err(ClientError::decode("channel history"))?;
            if !page.ok && page.error.is_some() {
                return Err(rejected(page.error));
            }
            let next = page.messages.last().map(|m| m.ts.clone());
            messages.extend(page.messages);
            match next {
                Some(ts) if page.has_more => latest = ts,
                _ => break,
            }
        }
        info!(channel_id, count = messages.len(), "Fetched channel history");
        Ok(messages)
    }

    async fn delete_message(&self, channel_id: &str, ts: &str) -> Result<(), ClientError> {
        let url = endpoint(
            &slack_method("chat.delete"),
            &[("channel", channel_id), ("ts", ts)],
        )?;
        let body = self.call(Method::POST, url).await?;
        let status: SlackStatus =
            serde_json::from_slice(&body).map_err(ClientError::decode("delete response"))?;
        if !status.ok {
            return Err(rejected(status.error));
        }
        info!(channel_id, ts, "Deleted message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockTransport, Reply};

    fn channels() -> Vec<Channel> {
        vec![
            Channel {
                id: "C001".into(),
                name: "general".into(),
                creator: "U1".into(),
            },
            Channel {
                id: "C002".into(),
                name: "random".into(),
                creator: "U1".into(),
            },
        ]
    }

    #[test]
    fn names_and_ids_both_resolve() {
        assert_eq!(find_channel_id(&channels(), "random").as_deref(), Some("C002"));
        assert_eq!(find_channel_id(&channels(), "C001").as_deref(), Some("C001"));
        assert_eq!(find_channel_id(&channels(), "missing"), None);
    }

    #[tokio::test]
    async fn identity_reads_team_and_user() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url().ends_with("auth.test") && req.bearer_token() == Some("xoxp"))
            .returning(|_| {
                Ok(Reply::from_body(
                    r#"{"ok":true,"url":"https://t.slack.com/","team":"t","user":"me"}"#,
                ))
            });
        let identity = SlackClient::new(transport, "xoxp").identity().await.unwrap();
        assert_eq!(identity.team, "t");
        assert_eq!(identity.user, "me");
    }

    #[tokio::test]
    async fn invalid_token_fails_identity() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(Reply::from_body(r#"{"ok":false,"error":"invalid_auth"}"#)));
        let err = SlackClient::new(transport, "bad").identity().await.unwrap_err();
        assert!(matches!(err, ClientError::Slack(reason) if reason == "invalid_auth"));
    }
}

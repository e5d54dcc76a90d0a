use std::path::Path;

use anyhow::{bail, Context, Result};
use gislack_core::contract::SlackApi;
use gislack_core::models::{unix_to_local, Message, SlackFile};
use gislack_core::render::{display_time, to_json};
use gislack_core::request::SlackUpload;
use gislack_core::slack::SlackClient;
use tracing::info;

use super::prompt::{progress_bar, Confirmation, TerminalConfirmation};
use super::table::align;
use crate::load_config::{load_config, locate, require_slack_token};
use crate::options::{SlackArgs, SlackOperation};

pub async fn slack(args: SlackArgs) -> Result<String> {
    let operation = SlackOperation::try_from(&args)?;
    let location = locate(&args)?;
    let config = load_config(&location.file)?;
    let client = SlackClient::new(super::http_transport()?, require_slack_token(&config)?);
    run_slack(&operation, &client, &location.workdir, args.jsonparser).await
}

fn with_total(table: String, total: usize) -> String {
    format!("{table}\n Total : {total}")
}

pub fn file_table(files: &[SlackFile]) -> String {
    let mut rows = vec![vec![
        "# Title".to_string(),
        "# Created time".to_string(),
        "# fileID".to_string(),
        "# channel".to_string(),
        "# user".to_string(),
        "# fileType".to_string(),
    ]];
    rows.extend(files.iter().rev().map(|f| {
        vec![
            f.title.clone(),
            display_time(f.created_time.as_ref()),
            f.id.clone(),
            format!("[{}]", f.channels.join(" ")),
            f.user.clone(),
            f.filetype.clone(),
        ]
    }));
    with_total(align(&rows), files.len())
}

fn message_time(ts: &str) -> String {
    let secs = ts.parse::<f64>().map(|t| t.trunc() as i64).unwrap_or(0);
    display_time(unix_to_local(secs).as_ref())
}

pub fn history_table(messages: &[Message]) -> String {
    let mut rows = vec![vec![
        "# Created date".to_string(),
        "# text".to_string(),
        "# user".to_string(),
        "# ts(historyID)".to_string(),
    ]];
    rows.extend(messages.iter().rev().map(|m| {
        vec![
            message_time(&m.ts),
            m.text.clone(),
            m.author().to_string(),
            m.ts.clone(),
        ]
    }));
    with_total(align(&rows), messages.len())
}

/// Deletes every file matching the filters once the user agrees.
pub async fn delete_all_files<S: SlackApi + ?Sized, C: Confirmation + ?Sized>(
    api: &S,
    confirmation: &C,
    channel: Option<&str>,
    user: Option<String>,
) -> Result<String> {
    let channel_id = match channel {
        Some(name) => Some(api.resolve_channel(name).await?),
        None => None,
    };
    let files = api.files(channel_id, user).await?;
    let identity = api.identity().await?;
    let prompt = format!(
        "Here is a team '{}' on Slack. You are {}.\n[WARNING] Will you delete all files here?",
        identity.team, identity.user
    );
    if !confirmation.confirm(&prompt)? {
        return Ok(format!(
            "Team {}'s files on Slack were not deleted.",
            identity.team
        ));
    }
    if files.is_empty() {
        return Ok("No files.".to_string());
    }
    let bar = progress_bar(files.len());
    for file in &files {
        if !api.delete_file(&file.id).await? {
            bar.abandon();
            bail!(
                "[ {} ] Overuse of API, or owner of this channel may not be you.",
                file.id
            );
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(count = files.len(), "Deleted Slack files");
    Ok("Done.".to_string())
}

/// Deletes up to `count` messages of a channel, oldest first.
pub async fn delete_oldest_messages<S: SlackApi + ?Sized>(
    api: &S,
    channel: &str,
    count: usize,
) -> Result<String> {
    let channel_id = api.resolve_channel(channel).await?;
    let messages = api.history(&channel_id).await?;
    if messages.is_empty() {
        return Ok(format!("No history in channel {channel}."));
    }
    let oldest: Vec<&Message> = messages.iter().rev().take(count).collect();
    let bar = progress_bar(oldest.len());
    for message in &oldest {
        api.delete_message(&channel_id, &message.ts)
            .await
            .with_context(|| {
                format!(
                    "cannot delete {}. Overuse of API, or owner of this channel may not be you",
                    message.ts
                )
            })?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(channel_id = %channel_id, count = oldest.len(), "Deleted channel history");
    Ok("Done.".to_string())
}

pub async fn run_slack<S: SlackApi + ?Sized>(
    operation: &SlackOperation,
    api: &S,
    workdir: &Path,
    pretty: bool,
) -> Result<String> {
    info!(operation = ?operation, "Running slack command");
    let text = match operation {
        SlackOperation::ChannelList => {
            let channels = api.channels().await?;
            if channels.is_empty() {
                bail!("No channels.");
            }
            let mut rows = vec![vec![
                "# channelname".to_string(),
                "# channalID".to_string(),
                "# creator".to_string(),
            ]];
            rows.extend(
                channels
                    .iter()
                    .map(|c| vec![c.name.clone(), c.id.clone(), c.creator.clone()]),
            );
            align(&rows).trim_end().to_string()
        }
        SlackOperation::FileList {
            channel,
            user,
            as_json,
        } => {
            let channel_id = match channel {
                Some(name) => Some(api.resolve_channel(name).await?),
                None => None,
            };
            let files = api.files(channel_id, user.clone()).await?;
            if files.is_empty() {
                "No files.".to_string()
            } else if *as_json {
                to_json(&files, true)?
            } else {
                file_table(&files)
            }
        }
        SlackOperation::GetFile(id) => to_json(&api.file_info(id).await?, true)?,
        SlackOperation::ChannelHistory(channel) => {
            let channel_id = api.resolve_channel(channel).await?;
            let messages = api.history(&channel_id).await?;
            if messages.is_empty() {
                format!("No history in channel {channel}.")
            } else {
                history_table(&messages)
            }
        }
        SlackOperation::Upload {
            channel,
            title,
            filetype,
            initial_comment,
            source,
        } => {
            let upload = SlackUpload {
                channel_id: api.resolve_channel(channel).await?,
                title: title.clone(),
                filetype: filetype.clone(),
                initial_comment: initial_comment.clone(),
                source: source.clone(),
            };
            to_json(&api.upload(&upload, workdir).await?, pretty)?
        }
        SlackOperation::DeleteFile(id) => {
            if api.delete_file(id).await? {
                "Done.".to_string()
            } else {
                "Error: File has already been deleted.".to_string()
            }
        }
        SlackOperation::DeleteFiles { channel, user } => {
            delete_all_files(api, &TerminalConfirmation, channel.as_deref(), user.clone()).await?
        }
        SlackOperation::DeleteHistory { channel, ts } => {
            let channel_id = api.resolve_channel(channel).await?;
            api.delete_message(&channel_id, ts).await?;
            "Done.".to_string()
        }
        SlackOperation::DeleteHistories { channel, count } => {
            delete_oldest_messages(api, channel, *count).await?
        }
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gislack_core::contract::MockSlackApi;
    use gislack_core::error::ClientError;
    use gislack_core::models::{Channel, SlackIdentity};
    use std::sync::Mutex;

    #[tokio::test]
    async fn empty_channel_list_is_an_error() {
        let mut api = MockSlackApi::new();
        api.expect_channels().returning(|| Ok(vec![]));
        let err = run_slack(&SlackOperation::ChannelList, &api, Path::new("."), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No channels.");
    }

    #[tokio::test]
    async fn channel_list_is_tabulated() {
        let mut api = MockSlackApi::new();
        api.expect_channels().returning(|| {
            Ok(vec![Channel {
                id: "C1".into(),
                name: "general".into(),
                creator: "U1".into(),
            }])
        });
        let text = run_slack(&SlackOperation::ChannelList, &api, Path::new("."), false)
            .await
            .unwrap();
        assert_eq!(text, "# channelname # channalID # creator\ngeneral       C1          U1");
    }

    #[tokio::test]
    async fn file_list_filters_by_resolved_channel() {
        let mut api = MockSlackApi::new();
        api.expect_resolve_channel()
            .withf(|name| name == "general")
            .returning(|_| Ok("C1".into()));
        api.expect_files()
            .withf(|channel, user| channel.as_deref() == Some("C1") && user.is_none())
            .returning(|_, _| Ok(vec![]));
        let op = SlackOperation::FileList {
            channel: Some("general".into()),
            user: None,
            as_json: false,
        };
        let text = run_slack(&op, &api, Path::new("."), false).await.unwrap();
        assert_eq!(text, "No files.");
    }

    #[tokio::test]
    async fn deleting_a_gone_file_is_reported() {
        let mut api = MockSlackApi::new();
        api.expect_delete_file().returning(|_| Ok(false));
        let text = run_slack(
            &SlackOperation::DeleteFile("F1".into()),
            &api,
            Path::new("."),
            false,
        )
        .await
        .unwrap();
        assert_eq!(text, "Error: File has already been deleted.");
    }

    #[tokio::test]
    async fn unknown_history_channel_propagates() {
        let mut api = MockSlackApi::new();
        api.expect_resolve_channel()
            .returning(|name| Err(ClientError::ChannelNotFound(name.to_string())));
        let err = run_slack(
            &SlackOperation::DeleteHistory {
                channel: "nope".into(),
                ts: "1.0".into(),
            },
            &api,
            Path::new("."),
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no channel ID for nope"));
    }

    #[test]
    fn history_table_counts_messages() {
        let messages: Vec<Message> = serde_json::from_str(
            r#"[{"type":"message","user":"U1","text":"hi","ts":"1501588800.000100"}]"#,
        )
        .unwrap();
        let table = history_table(&messages);
        assert!(table.contains("hi"));
        assert!(table.ends_with("\n Total : 1"));
    }

    struct Answer(bool);

    impl Confirmation for Answer {
        fn confirm(&self, prompt: &str) -> Result<bool> {
            assert!(prompt.contains("team 'acme'") && prompt.contains("You are me."));
            Ok(self.0)
        }
    }

    fn file(id: &str) -> SlackFile {
        SlackFile {
            id: id.into(),
            ..Default::default()
        }
    }

    fn identity() -> SlackIdentity {
        SlackIdentity {
            ok: true,
            team: "acme".into(),
            user: "me".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn delete_files_removes_the_filtered_list() {
        let mut api = MockSlackApi::new();
        api.expect_files()
            .withf(|channel, user| channel.is_none() && user.as_deref() == Some("U1"))
            .returning(|_, _| Ok(vec![file("F1"), file("F2")]));
        api.expect_identity().returning(|| Ok(identity()));
        api.expect_delete_file().times(2).returning(|_| Ok(true));
        let text = delete_all_files(&api, &Answer(true), None, Some("U1".into()))
            .await
            .unwrap();
        assert_eq!(text, "Done.");
    }

    #[tokio::test]
    async fn declined_delete_files_keeps_everything() {
        let mut api = MockSlackApi::new();
        api.expect_files().returning(|_, _| Ok(vec![file("F1")]));
        api.expect_identity().returning(|| Ok(identity()));
        api.expect_delete_file().never();
        let text = delete_all_files(&api, &Answer(false), None, None)
            .await
            .unwrap();
        assert_eq!(text, "Team acme's files on Slack were not deleted.");
    }

    #[tokio::test]
    async fn delete_files_stops_at_the_first_refusal() {
        let mut api = MockSlackApi::new();
        api.expect_files()
            .returning(|_, _| Ok(vec![file("F1"), file("F2")]));
        api.expect_identity().returning(|| Ok(identity()));
        api.expect_delete_file().times(1).returning(|_| Ok(false));
        let err = delete_all_files(&api, &Answer(true), None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("[ F1 ]"));
    }

    #[tokio::test]
    async fn delete_histories_takes_the_oldest_first() {
        let deleted = std::sync::Arc::new(Mutex::new(Vec::new()));
        let seen = deleted.clone();
        let mut api = MockSlackApi::new();
        api.expect_resolve_channel().returning(|_| Ok("C1".into()));
        api.expect_history().returning(|_| {
            Ok(["3.0", "2.0", "1.0"]
                .iter()
                .map(|ts| Message {
                    ts: ts.to_string(),
                    ..Default::default()
                })
                .collect())
        });
        api.expect_delete_message().returning(move |channel, ts| {
            assert_eq!(channel, "C1");
            seen.lock().unwrap().push(ts.to_string());
            Ok(())
        });
        let text = delete_oldest_messages(&api, "general", 2).await.unwrap();
        assert_eq!(text, "Done.");
        assert_eq!(*deleted.lock().unwrap(), vec!["1.0", "2.0"]);
    }

    #[tokio::test]
    async fn delete_histories_on_empty_channel() {
        let mut api = MockSlackApi::new();
        api.expect_resolve_channel().returning(|_| Ok("C1".into()));
        api.expect_history().returning(|_| Ok(vec![]));
        api.expect_delete_message().never();
        let text = delete_oldest_messages(&api, "general", 5).await.unwrap();
        assert_eq!(text, "No history in channel general.");
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use gislack_core::contract::GistApi;
use gislack_core::gist::{version_id, GistClient};
use gislack_core::models::Gist;
use gislack_core::render::{display_time, simple_line, to_json};
use tracing::info;

use super::prompt::{progress_bar, Confirmation, TerminalConfirmation};
use super::table::align;
use crate::load_config::{load_config, locate, require_gist_token};
use crate::options::{GistArgs, GistOperation};

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GistOutput {
    pub pretty: bool,
    pub simple: bool,
}

pub async fn gist(args: GistArgs) -> Result<String> {
    let operation = GistOperation::try_from(&args)?;
    let location = locate(&args)?;
    let config = load_config(&location.file)?;
    let token = if operation.needs_token() {
        require_gist_token(&config)?
    } else {
        String::new()
    };
    let client = GistClient::new(super::http_transport()?, token);
    let output = GistOutput {
        pretty: args.jsonparser,
        simple: args.simpleresult,
    };
    run_gist(&operation, &client, &location.workdir, output).await
}

pub fn list_table(gists: &[Gist]) -> String {
    let mut rows = vec![vec![
        "# Description".to_string(),
        "# Updated time".to_string(),
        "# Public".to_string(),
        "# id".to_string(),
    ]];
    rows.extend(gists.iter().rev().map(|g| {
        vec![
            g.description.clone().unwrap_or_default(),
            display_time(g.updated_at.as_ref()),
            if g.public { "Public" } else { "Secret" }.to_string(),
            g.id.clone(),
        ]
    }));
    align(&rows)
}

pub fn simple_result(gist: &Gist) -> Result<String, serde_json::Error> {
    let created = display_time(gist.created_at.as_ref());
    simple_line(&[
        ("gist_created_at", created.as_str()),
        ("gist_id", gist.id.as_str()),
    ])
}

/// Deletes every gist of the account once the user agrees.
pub async fn delete_all_gists<G: GistApi + ?Sized, C: Confirmation + ?Sized>(
    api: &G,
    confirmation: &C,
) -> Result<String> {
    let gists = api.list().await?;
    let Some(first) = gists.first() else {
        return Ok("No gists.".to_string());
    };
    let owner = first
        .owner
        .as_ref()
        .map(|o| o.login.clone())
        .unwrap_or_default();
    let prompt = format!("These are {owner}'s Gists.\n[WARNING] Will you delete all gists?");
    if !confirmation.confirm(&prompt)? {
        return Ok(format!("{owner}'s Gists were not deleted."));
    }
    let bar = progress_bar(gists.len());
    for gist in &gists {
        api.delete(&gist.id)
            .await
            .with_context(|| format!("cannot delete gist {}", gist.id))?;
        bar.inc(1);
    }
    bar.finish_and_clear();
    info!(count = gists.len(), "Deleted all gists");
    Ok("Done.".to_string())
}

pub async fn run_gist<G: GistApi + ?Sized>(
    operation: &GistOperation,
    api: &G,
    workdir: &Path,
    output: GistOutput,
) -> Result<String> {
    info!(operation = ?operation, "Running gist command");
    let text = match operation {
        GistOperation::List { as_json } => {
            let gists = api.list().await?;
            if gists.is_empty() {
                "No gists.".to_string()
            } else if *as_json {
                to_json(&gists, true)?
            } else {
                list_table(&gists).trim_end().to_string()
            }
        }
        GistOperation::Get(id) => to_json(&api.get(id).await?, output.pretty)?,
        GistOperation::History(id) => to_json(&api.get(id).await?.history, output.pretty)?,
        GistOperation::Version(url) => to_json(&api.get(version_id(url)).await?, output.pretty)?,
        GistOperation::Create { draft, .. } => {
            let created = api.create(draft, workdir).await?;
            if output.simple {
                simple_result(&created)?
            } else {
                to_json(&created, output.pretty)?
            }
        }
        GistOperation::Update {
            id,
            overwrite,
            draft,
        } => to_json(
            &api.update(id, draft, *overwrite, workdir).await?,
            output.pretty,
        )?,
        GistOperation::Delete(id) => {
            let body = api.delete(id).await?;
            if body.trim().is_empty() {
                "Done.".to_string()
            } else {
                body
            }
        }
        GistOperation::DeleteAll => delete_all_gists(api, &TerminalConfirmation).await?,
    };
    Ok(text)
}

use std::time::Instant;

use anyhow::Result;
use gislack_core::double_submit::double_submit as submit;
use gislack_core::gist::GistClient;
use gislack_core::options::{Credentials, DoubleSubmitInput, DoubleSubmitOptions};
use gislack_core::render::render;
use gislack_core::slack::SlackClient;
use tracing::info;

use crate::load_config::{load_config, locate, require_gist_token, require_slack_token};
use crate::options::DoubleSubmitArgs;

pub async fn double_submit(args: DoubleSubmitArgs) -> Result<String> {
    let started = Instant::now();
    let location = locate(&args)?;
    let options = DoubleSubmitOptions::try_from(DoubleSubmitInput::from(args))?;
    let config = load_config(&location.file)?;
    let credentials = Credentials {
        gist_token: require_gist_token(&config)?,
        slack_token: require_slack_token(&config)?,
    };

    let transport = super::http_transport()?;
    let gist = GistClient::new(transport.clone(), credentials.gist_token.clone());
    let slack = SlackClient::new(transport.clone(), credentials.slack_token.clone());

    info!(mode = ?options.mode, channel = %options.channel, "Starting dual submission");
    let output = submit(
        &options,
        &credentials,
        &location.workdir,
        started,
        &transport,
        &gist,
        &slack,
    )
    .await?;
    Ok(render(&output, options.format)?)
}

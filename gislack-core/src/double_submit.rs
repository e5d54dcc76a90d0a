//! Coordinating module for a dual submission: resolve, build, dispatch, correlate, unify.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::contract::{GistApi, SlackApi, Transport};
use crate::correlate::correlate;
use crate::dispatch::dispatch;
use crate::error::SubmitError;
use crate::options::{Credentials, DoubleSubmitOptions, SubmitMode};
use crate::render::{unify, UnifiedOutput};
use crate::request::DualSubmissionJob;

/// Submits one file to a gist and a Slack channel at the same time.
///
/// The channel is resolved and, for an overwriting update, the gist's current file names are
/// read before either submission starts. Both submissions then run concurrently over
/// `transport`; the result is returned only once both have answered.
pub async fn double_submit<T, G, S>(
    opts: &DoubleSubmitOptions,
    credentials: &Credentials,
    workdir: &Path,
    started: Instant,
    transport: &T,
    gist: &G,
    slack: &S,
) -> Result<UnifiedOutput, SubmitError>
where
    T: Transport + ?Sized,
    G: GistApi + ?Sized,
    S: SlackApi + ?Sized,
{
    let channel_id = slack.resolve_channel(&opts.channel).await.map_err(|e| {
        error!(channel = %opts.channel, error = %e, "Channel could not be resolved");
        e
    })?;
    debug!(channel = %opts.channel, channel_id = %channel_id, "Resolved channel");

    let existing_files = match &opts.mode {
        SubmitMode::UpdateOverwrite(id) => gist.get(id).await?.file_names(),
        SubmitMode::Create | SubmitMode::UpdateAdd(_) => Vec::new(),
    };

    let job = DualSubmissionJob::build(
        opts,
        credentials,
        &channel_id,
        &existing_files,
        workdir,
        started,
    )?;

    let dispatched = dispatch(transport, &job).await;
    if !dispatched.is_complete() {
        let collected = dispatched.responses.len();
        error!(collected, "Dual submission incomplete");
        return Err(SubmitError::PartialDispatchFailure {
            collected,
            failures: dispatched.failures,
        });
    }

    let result = correlate(&dispatched.responses)?;
    info!(
        gist_id = %result.gist.id,
        slack_id = %result.slack.file.id,
        "Dual submission complete"
    );
    Ok(unify(result, job.started(), opts.format))
}

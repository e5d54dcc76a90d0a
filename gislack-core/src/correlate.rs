//! # Response Correlator
//!
//! Assigns the raw bodies of a dispatch to their Gist and Slack slots. Origins come from the
//! tag each request carried at submission time, so the assignment does not depend on which
//! response finished first and never inspects the body to guess where it came from.
//!
//! Pure and synchronous: decode, check, return.

use crate::dispatch::RawResponse;
use crate::error::SubmitError;
use crate::models::{Gist, Service, SlackFileResponse};

/// The typed pair of a dual submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelatedResult {
    pub gist: Gist,
    pub slack: SlackFileResponse,
}

fn slot<'a>(responses: &'a [RawResponse], service: Service) -> Result<&'a RawResponse, SubmitError> {
    let mut tagged = responses.iter().filter(|r| r.origin == service);
    match (tagged.next(), tagged.next()) {
        (Some(response), None) => Ok(response),
        (None, _) => Err(SubmitError::CorrelationUnavailable(format!(
            "no response from {service}"
        ))),
        (Some(_), Some(_)) => Err(SubmitError::CorrelationUnavailable(format!(
            "more than one response tagged {service}"
        ))),
    }
}

pub fn correlate(responses: &[RawResponse]) -> Result<CorrelatedResult, SubmitError> {
    if responses.len() != 2 {
        return Err(SubmitError::CorrelationUnavailable(format!(
            "expected 2 responses, got {}",
            responses.len()
        )));
    }
    let gist_raw = slot(responses, Service::Gist)?;
    let slack_raw = slot(responses, Service::Slack)?;

    let gist: Gist =
        serde_json::from_slice(&gist_raw.body).map_err(|source| SubmitError::MalformedResponse {
            service: Service::Gist,
            source,
        })?;
    let mut slack: SlackFileResponse = serde_json::from_slice(&slack_raw.body).map_err(|source| {
        SubmitError::MalformedResponse {
            service: Service::Slack,
            source,
        }
    })?;

    if !slack.ok {
        return Err(SubmitError::ServiceRejected {
            service: Service::Slack,
            message: slack.error.unwrap_or_else(|| "ok was false".to_string()),
        });
    }
    slack.file = slack.file.with_local_time();

    Ok(CorrelatedResult { gist, slack })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIST_BODY: &str = r#"{"id":"g1","html_url":"https://gist.github.com/g1","created_at":"2017-08-01T00:00:00Z","updated_at":"2017-08-01T00:00:00Z","owner":{"login":"octo"}}"#;
    const SLACK_BODY: &str = r#"{"ok":true,"file":{"id":"F1","created":1501545600,"name":"a.txt","title":"t","filetype":"text"}}"#;

    fn raw(origin: Service, body: &str) -> RawResponse {
        RawResponse {
            origin,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn assignment_ignores_arrival_order() {
        let gist_first = correlate(&[raw(Service::Gist, GIST_BODY), raw(Service::Slack, SLACK_BODY)])
            .expect("both present");
        let slack_first = correlate(&[raw(Service::Slack, SLACK_BODY), raw(Service::Gist, GIST_BODY)])
            .expect("both present");
        assert_eq!(gist_first, slack_first);
        assert_eq!(gist_first.gist.id, "g1");
        assert_eq!(gist_first.slack.file.id, "F1");
        assert!(gist_first.slack.file.created_time.is_some());
    }

    #[test]
    fn gist_body_with_truthy_ok_is_still_gist() {
        let odd_gist = r#"{"id":"g2","ok":true}"#;
        let result = correlate(&[raw(Service::Slack, SLACK_BODY), raw(Service::Gist, odd_gist)])
            .expect("tags decide");
        assert_eq!(result.gist.id, "g2");
        assert_eq!(result.slack.file.id, "F1");
    }

    #[test]
    fn fewer_than_two_bodies_is_unavailable() {
        assert!(matches!(
            correlate(&[]),
            Err(SubmitError::CorrelationUnavailable(_))
        ));
        assert!(matches!(
            correlate(&[raw(Service::Slack, SLACK_BODY)]),
            Err(SubmitError::CorrelationUnavailable(_))
        ));
    }

    #[test]
    fn duplicate_origin_is_unavailable() {
        let res = correlate(&[raw(Service::Gist, GIST_BODY), raw(Service::Gist, GIST_BODY)]);
        assert!(matches!(res, Err(SubmitError::CorrelationUnavailable(_))));
    }

    #[test]
    fn slack_not_ok_is_rejected() {
        let res = correlate(&[
            raw(Service::Gist, GIST_BODY),
            raw(Service::Slack, r#"{"ok":false,"error":"channel_not_found"}"#),
        ]);
        match res {
            Err(SubmitError::ServiceRejected { service, message }) => {
                assert_eq!(service, Service::Slack);
                assert_eq!(message, "channel_not_found");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        let res = correlate(&[raw(Service::Gist, "<html>"), raw(Service::Slack, SLACK_BODY)]);
        assert!(matches!(
            res,
            Err(SubmitError::MalformedResponse {
                service: Service::Gist,
                ..
            })
        ));
    }
}

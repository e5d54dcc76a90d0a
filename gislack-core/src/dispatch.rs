//! # Parallel Dispatcher
//!
//! Runs the two requests of a [`DualSubmissionJob`] concurrently and collects what comes back.
//! Each request is one named task; both are polled together and drained to completion before
//! [`dispatch`] returns, so the caller only ever sees the finished collection.
//!
//! Responses are appended in completion order and tagged with the service they were sent to.
//! A failed request is logged and recorded as a [`SlotFailure`]; it never cancels its sibling.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{error, info};

use crate::contract::Transport;
use crate::error::{SlotFailure, TransportError};
use crate::models::Service;
use crate::request::{DualSubmissionJob, RequestDescriptor};

/// A raw response body tagged with the service whose request produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub origin: Service,
    pub body: Vec<u8>,
}

/// Outcome of one dispatch: at most two responses, plus one failure per missing response.
#[derive(Debug, Default)]
pub struct Dispatched {
    pub responses: Vec<RawResponse>,
    pub failures: Vec<SlotFailure>,
}

impl Dispatched {
    pub fn is_complete(&self) -> bool {
        self.responses.len() == 2
    }
}

async fn send<T>(
    transport: &T,
    origin: Service,
    request: &RequestDescriptor,
) -> (Service, Result<Vec<u8>, TransportError>)
where
    T: Transport + ?Sized,
{
    let result = transport.execute(request).await.map(|reply| reply.body);
    (origin, result)
}

pub async fn dispatch<T>(transport: &T, job: &DualSubmissionJob) -> Dispatched
where
    T: Transport + ?Sized,
{
    let mut in_flight = FuturesUnordered::new();
    in_flight.push(send(transport, Service::Gist, job.gist()));
    in_flight.push(send(transport, Service::Slack, job.slack()));

    let mut dispatched = Dispatched::default();
    while let Some((origin, result)) = in_flight.next().await {
        match result {
            Ok(body) => {
                info!(service = %origin, bytes = body.len(), "Response collected");
                dispatched.responses.push(RawResponse { origin, body });
            }
            Err(e) => {
                error!(service = %origin, error = %e, "Request failed, sibling request continues");
                dispatched.failures.push(SlotFailure { service: origin, error: e });
            }
        }
    }
    dispatched
}

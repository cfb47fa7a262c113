//! Single-flight classification requests.
//!
//! [`RequestController`] owns at most one outstanding classification call.
//! Issuing a new request drops the previous call's future on the spot, so a
//! late reply for a superseded request can never be observed. Every issued
//! request ends in exactly one of: a [`Completion`] (intent, no intent,
//! timeout or transport failure), supersession, or disposal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::error::RequestError;
use crate::models::Intent;
use crate::service::{FeedStream, IntentClassifier};

/// Classification calls that take longer than this resolve to no intent.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Outcome = Result<Option<Intent>, RequestError>;

/// Terminal event of one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generation token handed out by [`RequestController::issue`].
    pub generation: u64,
    /// `Ok(None)` when the classifier found no intent.
    pub outcome: Outcome,
}

impl Completion {
    /// The intent to show, collapsing every failure to "no result".
    pub fn into_intent(self) -> Option<Intent> {
        self.outcome.ok().flatten()
    }
}

struct InFlight {
    generation: u64,
    request: String,
    future: Pin<Box<dyn Future<Output = Outcome> + Send>>,
}

/// Runs one classification request at a time, last-issued-wins.
pub struct RequestController {
    classifier: Option<Arc<dyn IntentClassifier>>,
    timeout: Duration,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl RequestController {
    /// Creates a controller. `classifier` may be absent until the
    /// transport is up; requests issued meanwhile are dropped.
    pub fn new(classifier: Option<Arc<dyn IntentClassifier>>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
            generation: 0,
            in_flight: None,
        }
    }

    /// Returns `true` while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Token of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Text of the outstanding request, if any.
    pub fn outstanding(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|f| f.request.as_str())
    }

    /// Issues a classification request, superseding any outstanding one.
    ///
    /// Returns the new generation token.
    ///
    /// # Errors
    ///
    /// - [`RequestError::EmptyRequest`] if `request` is empty. Nothing
    ///   changes, the outstanding request (if any) keeps running.
    /// - [`RequestError::ServiceUnavailable`] if no classifier is attached.
    pub fn issue(&mut self, request: &str) -> Result<u64, RequestError> {
        if request.is_empty() {
            debug!("Skipping classification, request text is empty");
            return Err(RequestError::EmptyRequest);
        }
        let Some(classifier) = self.classifier.as_ref() else {
            warn!(request, "Dropping classification request, classifier not available");
            return Err(RequestError::ServiceUnavailable("classifier"));
        };

        let stream = classifier.classify(request);
        let deadline = Instant::now() + self.timeout;

        self.supersede();
        self.generation += 1;
        info!(request, generation = self.generation, "Sending classification request");

        self.in_flight = Some(InFlight {
            generation: self.generation,
            request: request.to_string(),
            future: Box::pin(first_intent(stream, deadline)),
        });

        Ok(self.generation)
    }

    /// Drops the outstanding request without a completion.
    pub fn cancel(&mut self) -> bool {
        self.supersede()
    }

    /// Cancels the outstanding request and detaches the classifier. Later
    /// [`issue`](Self::issue) calls fail with `ServiceUnavailable`.
    pub fn dispose(&mut self) {
        self.supersede();
        self.classifier = None;
    }

    fn supersede(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                debug!(
                    request = %flight.request,
                    generation = flight.generation,
                    reason = %RequestError::RequestSuperseded,
                    "Discarding outstanding classification request"
                );
                true
            }
            None => false,
        }
    }

    /// Waits for the outstanding request to finish.
    ///
    /// Never resolves while idle. Cancel-safe: the request keeps running
    /// if this future is dropped.
    pub async fn completion(&mut self) -> Completion {
        let Some(flight) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };
        let outcome = flight.future.as_mut().await;
        let generation = flight.generation;
        let request = std::mem::take(&mut flight.request);
        self.in_flight = None;

        match &outcome {
            Ok(Some(intent)) => {
                info!(%request, generation, kind = ?intent.kind, "Received intent");
            }
            Ok(None) => info!(%request, generation, "No intent found"),
            Err(e) if e.is_silent() => debug!(%request, generation, "{e}"),
            Err(e) => warn!(%request, generation, "Classification failed: {e}"),
        }

        Completion {
            generation,
            outcome,
        }
    }
}

/// Takes the first candidate of the first emitted list.
async fn first_intent(mut stream: FeedStream<Vec<Intent>>, deadline: Instant) -> Outcome {
    match timeout_at(deadline, stream.next()).await {
        Err(_) => Err(RequestError::RequestTimeout),
        Ok(None) => Ok(None),
        Ok(Some(Err(e))) => Err(e.into()),
        Ok(Some(Ok(candidates))) => Ok(candidates.into_iter().next()),
    }
}

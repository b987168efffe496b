//! Format negotiation against the backend
//!
//! The backend's accepted request shape is whatever returns a 200. The
//! [`Negotiator`] walks `candidate × credential × content-type` in a fixed
//! order, issuing one POST per attempt, and stops at the first 200.
//!
//! Two modes share the same decision rule:
//! - `sequential` (default): one attempt at a time, stop at the first 200
//! - `concurrent`: all attempts in flight at once, first 200 to arrive wins
//!   and the rest are dropped
//!
//! Every failure (timeout, refused connection, non-200) is absorbed into a
//! [`Rejection`]; negotiation itself never errors.

pub mod attempt;
pub mod outcome;
pub mod transport;

pub use attempt::{
    ContentType, CredentialEncoding, CredentialKind, NegotiationAttempt, enumerate_attempts,
};
pub use outcome::{BackendOutcome, Rejection};
pub use transport::{
    BackendResponse, BackendTransport, OutboundRequest, ReqwestTransport, TransportError,
};

use crate::config::NegotiationConfig;
use crate::error::{AppError, AppResult};
use crate::metrics::{AttemptLabels, Metrics, NegotiationResult};
use crate::middleware::RequestId;
use crate::translate::CandidateBody;
use axum::http::StatusCode;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// How attempts are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegotiationMode {
    /// One attempt at a time in enumeration order
    #[default]
    Sequential,
    /// All attempts at once, first accepted wins
    Concurrent,
}

/// Searches the attempt space for an accepted request format
pub struct Negotiator {
    transport: Arc<dyn BackendTransport>,
    credentials: Vec<CredentialKind>,
    content_types: Vec<ContentType>,
    mode: NegotiationMode,
    metrics: Arc<Metrics>,
}

impl Negotiator {
    /// Create a negotiator over the configured credential and content-type axes
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is empty, which would make every
    /// negotiation fail without contacting the backend.
    pub fn new(
        transport: Arc<dyn BackendTransport>,
        config: &NegotiationConfig,
        metrics: Arc<Metrics>,
    ) -> AppResult<Self> {
        if config.credentials.is_empty() || config.content_types.is_empty() {
            return Err(AppError::Config(
                "negotiation needs at least one credential encoding and one content type"
                    .to_string(),
            ));
        }

        Ok(Self {
            transport,
            credentials: config.credentials.clone(),
            content_types: config.content_types.clone(),
            mode: config.mode,
            metrics,
        })
    }

    /// Configured mode
    pub fn mode(&self) -> NegotiationMode {
        self.mode
    }

    /// Number of attempts a negotiation over `candidate_count` candidates may issue
    pub fn attempt_space_size(&self, candidate_count: usize) -> usize {
        candidate_count * self.credentials.len() * self.content_types.len()
    }

    /// Probe the backend until one attempt is accepted
    ///
    /// Returns the first `Accepted` outcome, or `Rejected` carrying the
    /// rejection of the last attempt in enumeration order.
    pub async fn negotiate(
        &self,
        candidates: &[CandidateBody],
        token: &str,
        request_id: RequestId,
    ) -> BackendOutcome {
        let attempts =
            enumerate_attempts(candidates, &self.credentials, &self.content_types, token);
        let start = Instant::now();

        tracing::debug!(
            request_id = %request_id,
            backend = %self.transport.endpoint(),
            attempt_count = attempts.len(),
            mode = ?self.mode,
            "Starting format negotiation"
        );

        let outcome = match self.mode {
            NegotiationMode::Sequential => self.run_sequential(&attempts, request_id).await,
            NegotiationMode::Concurrent => self.run_concurrent(&attempts, request_id).await,
        };

        let result = match &outcome {
            BackendOutcome::Accepted { .. } => NegotiationResult::Accepted,
            BackendOutcome::Rejected(rejection) if rejection.is_auth_failure() => {
                NegotiationResult::AuthRejected
            }
            BackendOutcome::Rejected(_) => NegotiationResult::Exhausted,
        };
        self.metrics
            .record_negotiation(result, start.elapsed().as_secs_f64());

        if let BackendOutcome::Rejected(rejection) = &outcome {
            tracing::warn!(
                request_id = %request_id,
                attempt_count = attempts.len(),
                last_rejection = rejection.kind(),
                last_status = ?rejection.status().map(|s| s.as_u16()),
                "Format negotiation exhausted without an accepted attempt"
            );
        }

        outcome
    }

    async fn run_sequential(
        &self,
        attempts: &[NegotiationAttempt<'_>],
        request_id: RequestId,
    ) -> BackendOutcome {
        let mut last = Rejection::NoAttempts;

        for attempt in attempts {
            match self.run_attempt(attempt, request_id).await {
                accepted @ BackendOutcome::Accepted { .. } => return accepted,
                BackendOutcome::Rejected(rejection) => last = rejection,
            }
        }

        BackendOutcome::Rejected(last)
    }

    async fn run_concurrent(
        &self,
        attempts: &[NegotiationAttempt<'_>],
        request_id: RequestId,
    ) -> BackendOutcome {
        let mut in_flight: FuturesUnordered<_> = attempts
            .iter()
            .map(|attempt| async move { (attempt.index, self.run_attempt(attempt, request_id).await) })
            .collect();

        let mut rejections: Vec<Option<Rejection>> = vec![None; attempts.len()];

        while let Some((index, outcome)) = in_flight.next().await {
            match outcome {
                // Dropping `in_flight` on return cancels the remaining attempts
                accepted @ BackendOutcome::Accepted { .. } => return accepted,
                BackendOutcome::Rejected(rejection) => rejections[index] = Some(rejection),
            }
        }

        let last = rejections
            .into_iter()
            .rev()
            .flatten()
            .next()
            .unwrap_or(Rejection::NoAttempts);

        BackendOutcome::Rejected(last)
    }

    async fn run_attempt(
        &self,
        attempt: &NegotiationAttempt<'_>,
        request_id: RequestId,
    ) -> BackendOutcome {
        let shape = attempt.body.shape();
        let labels = AttemptLabels {
            shape: shape.as_str(),
            credential: attempt.credential.kind().as_str(),
            content_type: attempt.content_type.as_str(),
        };

        let body = match attempt.body.to_bytes() {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    attempt = attempt.index,
                    shape = %shape,
                    error = %e,
                    "Failed to serialize candidate body, skipping attempt"
                );
                let rejection = Rejection::InvalidCandidate(e.to_string());
                self.metrics.record_attempt(&labels, rejection.kind());
                return BackendOutcome::Rejected(rejection);
            }
        };

        let request = OutboundRequest {
            body,
            content_type: attempt.content_type,
            authorization: attempt.credential.header_value(),
        };

        let outcome = match self.transport.send(request).await {
            Ok(response) if response.status == StatusCode::OK => BackendOutcome::Accepted {
                body: response.body,
                status: response.status,
            },
            Ok(response) => BackendOutcome::Rejected(Rejection::Status {
                status: response.status,
                body: Some(response.body).filter(|b| !b.is_empty()),
            }),
            Err(TransportError::Timeout(_)) => BackendOutcome::Rejected(Rejection::Timeout),
            Err(err @ TransportError::ResponseTooLarge { .. }) => {
                BackendOutcome::Rejected(Rejection::Transport(err.to_string()))
            }
            Err(TransportError::Request(reason)) => {
                BackendOutcome::Rejected(Rejection::Transport(reason))
            }
        };

        match &outcome {
            BackendOutcome::Accepted { .. } => {
                self.metrics.record_attempt(&labels, "accepted");
                tracing::info!(
                    request_id = %request_id,
                    attempt = attempt.index,
                    shape = labels.shape,
                    credential = labels.credential,
                    content_type = labels.content_type,
                    "Backend accepted request format"
                );
            }
            BackendOutcome::Rejected(rejection) => {
                self.metrics.record_attempt(&labels, rejection.kind());
                tracing::debug!(
                    request_id = %request_id,
                    attempt = attempt.index,
                    shape = labels.shape,
                    credential = labels.credential,
                    content_type = labels.content_type,
                    rejection = rejection.kind(),
                    status = ?rejection.status().map(|s| s.as_u16()),
                    "Backend rejected request format"
                );
            }
        }

        outcome
    }
}

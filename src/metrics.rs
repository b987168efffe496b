//! Prometheus metrics collection for kiroproxy
//!
//! This module provides metrics instrumentation for tracking:
//! - Negotiation attempts by candidate shape, credential encoding, content type and outcome
//! - Negotiation results (accepted, auth rejected, exhausted)
//! - Negotiation latency
//! - `/v1/messages` pass-through requests by outcome
//! - System clock errors
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

const ATTEMPTS_TOTAL: &str = "kiroproxy_negotiation_attempts_total";
const NEGOTIATIONS_TOTAL: &str = "kiroproxy_negotiations_total";
const CLOCK_ERRORS_TOTAL: &str = "kiroproxy_clock_errors_total";
const PASSTHROUGH_TOTAL: &str = "kiroproxy_passthrough_requests_total";

/// Final result of a negotiation, for type-safe metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationResult {
    /// Some attempt got a 200
    Accepted,
    /// Every attempt was rejected and the last one with 401/403
    AuthRejected,
    /// Every attempt was rejected for any other reason
    Exhausted,
}

impl NegotiationResult {
    /// Convert result to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationResult::Accepted => "accepted",
            NegotiationResult::AuthRejected => "auth_rejected",
            NegotiationResult::Exhausted => "exhausted",
        }
    }
}

/// Outcome of one pass-through request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughOutcome {
    /// The backend answered, with any status
    Forwarded,
    Timeout,
    /// Connection failure or unreadable response
    Unavailable,
}

impl PassthroughOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassthroughOutcome::Forwarded => "forwarded",
            PassthroughOutcome::Timeout => "timeout",
            PassthroughOutcome::Unavailable => "unavailable",
        }
    }
}

/// Labels identifying one point of the attempt space
///
/// All three values come from the static strategy tables, so cardinality is
/// bounded by 4 shapes × 2 credentials × 2 content types.
#[derive(Debug, Clone, Copy)]
pub struct AttemptLabels {
    pub shape: &'static str,
    pub credential: &'static str,
    pub content_type: &'static str,
}

/// Metrics collector for kiroproxy
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    attempts_total: IntCounterVec,
    negotiations_total: IntCounterVec,
    negotiation_duration: Histogram,
    clock_errors: IntCounter,
    passthrough_total: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Outcome is one of: accepted, auth_rejected, status_rejected, timeout,
        // transport_error, invalid_candidate
        let attempts_total = IntCounterVec::new(
            Opts::new(
                ATTEMPTS_TOTAL,
                "Total backend attempts by candidate shape, credential encoding, content type and outcome",
            ),
            &["shape", "credential", "content_type", "outcome"],
        )?;

        let negotiations_total = IntCounterVec::new(
            Opts::new(NEGOTIATIONS_TOTAL, "Total format negotiations by result"),
            &["result"],
        )?;

        // Covers sequential searches of up to 16 attempts at 10s each
        let negotiation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "kiroproxy_negotiation_duration_seconds",
                "Wall-clock time of a whole format negotiation in seconds",
            )
            .buckets(vec![
                0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 160.0,
            ]),
        )?;

        // Alert on any increment: the system clock is before the UNIX epoch
        let clock_errors = IntCounter::with_opts(Opts::new(
            CLOCK_ERRORS_TOTAL,
            "Total number of system clock errors detected (clock before UNIX epoch)",
        ))?;

        let passthrough_total = IntCounterVec::new(
            Opts::new(PASSTHROUGH_TOTAL, "Total /v1/messages pass-through requests by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(negotiations_total.clone()))?;
        registry.register(Box::new(negotiation_duration.clone()))?;
        registry.register(Box::new(clock_errors.clone()))?;
        registry.register(Box::new(passthrough_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            attempts_total,
            negotiations_total,
            negotiation_duration,
            clock_errors,
            passthrough_total,
        })
    }

    /// Record one backend attempt and its outcome label
    pub fn record_attempt(&self, labels: &AttemptLabels, outcome: &str) {
        self.attempts_total
            .with_label_values(&[labels.shape, labels.credential, labels.content_type, outcome])
            .inc();
    }

    /// Record a finished negotiation
    ///
    /// Non-finite or negative durations are dropped with a warning; they would
    /// poison every histogram percentile.
    pub fn record_negotiation(&self, result: NegotiationResult, duration_secs: f64) {
        self.negotiations_total
            .with_label_values(&[result.as_str()])
            .inc();

        if !duration_secs.is_finite() || duration_secs < 0.0 {
            tracing::warn!(
                duration_secs,
                "Dropping invalid negotiation duration from histogram"
            );
            return;
        }
        self.negotiation_duration.observe(duration_secs);
    }

    /// Total attempts across every label combination
    pub fn attempts_count(&self) -> u64 {
        self.counter_sum(ATTEMPTS_TOTAL, |_| true)
    }

    /// Attempts whose outcome label equals `outcome`
    pub fn attempts_with_outcome(&self, outcome: &str) -> u64 {
        self.counter_sum(ATTEMPTS_TOTAL, |labels| {
            labels
                .iter()
                .any(|(name, value)| name == "outcome" && value == outcome)
        })
    }

    /// Negotiations that ended with `result`
    pub fn negotiations_count(&self, result: NegotiationResult) -> u64 {
        self.counter_sum(NEGOTIATIONS_TOTAL, |labels| {
            labels
                .iter()
                .any(|(name, value)| name == "result" && value == result.as_str())
        })
    }

    /// Record one pass-through request
    pub fn record_passthrough(&self, outcome: PassthroughOutcome) {
        self.passthrough_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Pass-through requests that ended with `outcome`
    pub fn passthrough_count(&self, outcome: PassthroughOutcome) -> u64 {
        self.counter_sum(PASSTHROUGH_TOTAL, |labels| {
            labels
                .iter()
                .any(|(name, value)| name == "outcome" && value == outcome.as_str())
        })
    }

    /// Record a system clock error
    ///
    /// Call this whenever `SystemTime::now().duration_since(UNIX_EPOCH)` fails.
    /// Response `created` timestamps fall back to 0 in that case.
    pub fn clock_error(&self) {
        self.clock_errors.inc();
    }

    /// Get the current count of clock errors
    pub fn clock_errors_count(&self) -> u64 {
        self.clock_errors.get()
    }

    /// Render all metrics in Prometheus text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the output is not UTF-8.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }

    fn counter_sum(&self, family: &str, filter: impl Fn(&[(String, String)]) -> bool) -> u64 {
        self.registry
            .gather()
            .iter()
            .find(|mf| mf.name() == family)
            .map(|mf| {
                mf.get_metric()
                    .iter()
                    .filter(|m| {
                        let labels: Vec<(String, String)> = m
                            .label
                            .iter()
                            .map(|l| (l.name().to_string(), l.value().to_string()))
                            .collect();
                        filter(&labels)
                    })
                    .map(|m| m.counter.value.unwrap_or(0.0) as u64)
                    .sum()
            })
            .unwrap_or(0)
    }
}

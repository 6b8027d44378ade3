//! Metrics capability negotiation and report generation.

use std::sync::Arc;

use tracing::debug;

use medialink_protocol::{MetricsReport, MetricsRequest, SchemeSupport, schemes};

use crate::engine::PlayerEngine;

/// Tracks which metrics subscriptions are active for the current streaming
/// session.
///
/// Insertion order is preserved and nothing is deduplicated: the same scheme
/// requested twice with different configuration ids is two independent
/// subscriptions, each owed its own final report.
#[derive(Default)]
pub struct MetricsCapabilityRegistry {
    supported: Vec<MetricsRequest>,
}

impl MetricsCapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers a capability query: one [`SchemeSupport`] per request, in
    /// request order, and records every supported request as an active
    /// subscription. Prior entries are kept; only
    /// [`reset_for_new_session`](Self::reset_for_new_session) clears them.
    pub fn query_capabilities(
        &mut self,
        engine: &dyn PlayerEngine,
        requests: Vec<MetricsRequest>,
    ) -> Vec<SchemeSupport> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let supported = engine.is_scheme_supported(&request.scheme);
            debug!(
                target = "medialink",
                scheme = %request.scheme,
                supported,
                "capability query"
            );
            results.push(SchemeSupport {
                scheme: request.scheme.clone(),
                supported,
            });
            if supported {
                self.supported.push(request);
            }
        }
        results
    }

    /// Clears every active subscription. Called exactly once at the start of
    /// each new streaming session, before any capability query for it.
    pub fn reset_for_new_session(&mut self) {
        self.supported.clear();
    }

    /// The active subscriptions, in the order they were accepted.
    pub fn supported_requests(&self) -> &[MetricsRequest] {
        &self.supported
    }
}

/// Produces a serialized report per scheme, delegating telemetry collection
/// to the engine.
pub struct MetricsReportGenerator {
    engine: Arc<dyn PlayerEngine>,
}

impl MetricsReportGenerator {
    pub fn new(engine: Arc<dyn PlayerEngine>) -> Self {
        Self { engine }
    }

    /// Generates the report for one subscription.
    ///
    /// The 3GPP DASH scheme has counter-style semantics: its telemetry is
    /// cumulative since the last report, so the engine's counters are reset
    /// immediately after capture. A missing request or unrecognized scheme
    /// yields an empty report and no reset; the protocol has no error kind
    /// for this path, so the empty payload is the signal.
    pub fn generate(&self, request: Option<&MetricsRequest>) -> MetricsReport {
        let Some(request) = request else {
            return MetricsReport::empty();
        };

        if request.scheme != schemes::THREE_GPP_DASH_METRICS {
            debug!(
                target = "medialink",
                scheme = %request.scheme,
                "unrecognized metrics scheme, returning empty report"
            );
            return MetricsReport {
                scheme: request.scheme.clone(),
                configuration_id: request.configuration_id.clone(),
                payload: String::new(),
            };
        }

        let payload = self.engine.collect_metrics(&request.scheme);
        self.engine.reset_metrics_counters();
        MetricsReport {
            scheme: request.scheme.clone(),
            configuration_id: request.configuration_id.clone(),
            payload,
        }
    }
}

//! Message kinds and their request/response pairing.

use serde::{Deserialize, Serialize};

/// Discriminant of every message on the coordinator channel.
///
/// Three families:
/// * requests (carry a reply address, expect exactly one response of the
///   paired kind): [`QueryMetricsCapabilities`](Self::QueryMetricsCapabilities),
///   [`GetMetrics`](Self::GetMetrics)
/// * responses: [`ReportMetricsCapabilities`](Self::ReportMetricsCapabilities),
///   [`ReportMetrics`](Self::ReportMetrics)
/// * one-way notifications: everything else.
///
/// Unrecognized tags deserialize to [`Unknown`](Self::Unknown) so a newer
/// coordinator never breaks dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Client introduces itself at connect; carries nothing beyond the
    /// reply address.
    Register,
    /// Coordinator instructs the client to start playback from entry points.
    TriggerPlayback,
    /// Coordinator asks which metrics reporting schemes are supported.
    QueryMetricsCapabilities,
    /// Response to [`QueryMetricsCapabilities`](Self::QueryMetricsCapabilities).
    ReportMetricsCapabilities,
    /// Coordinator requests a metrics report for one active subscription.
    GetMetrics,
    /// Response to [`GetMetrics`](Self::GetMetrics); also sent unsolicited
    /// during the final flush.
    ReportMetrics,
    /// Client notifies the coordinator of a canonical playback state change.
    PlaybackStateChanged,
    /// Client sets the media endpoint the coordinator should provision against.
    SetEndpoint,
    /// Client asks the coordinator to start playback from a service list entry.
    StartPlayback,
    /// Catch-all for kinds this build does not know about.
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    /// The response kind paired with a request kind, if any.
    pub fn paired_response(self) -> Option<MessageKind> {
        match self {
            MessageKind::QueryMetricsCapabilities => Some(MessageKind::ReportMetricsCapabilities),
            MessageKind::GetMetrics => Some(MessageKind::ReportMetrics),
            _ => None,
        }
    }
}

//! Typed payloads carried by the message kinds.
//!
//! Field names are camelCase on the wire, matching the coordinator's
//! serialization of these records.

use serde::{Deserialize, Serialize};

/// Canonical, engine-agnostic playback state reported to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackState {
    Idle,
    Buffering,
    /// The engine is ready but intentionally not playing.
    ReadyPaused,
    Playing,
    Ended,
    #[default]
    Unknown,
}

/// Content type of a media entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "application/dash+xml")]
    Dash,
    #[serde(rename = "application/vnd.apple.mpegurl")]
    Hls,
    #[serde(other, rename = "application/octet-stream")]
    Other,
}

/// One candidate media location offered by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    pub locator: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// A provisioned service the client may ask the coordinator to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceListEntry {
    pub provisioning_session_id: String,
    pub name: String,
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

/// A coordinator-issued metrics subscription, unique by
/// `(scheme, configuration_id)` within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    pub scheme: String,
    pub configuration_id: String,
    /// Requested reporting interval in seconds, when the scheme uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_interval: Option<u32>,
}

/// Capability-query result for one requested scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeSupport {
    pub scheme: String,
    pub supported: bool,
}

/// A generated report tied to exactly one accepted [`MetricsRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub scheme: String,
    pub configuration_id: String,
    /// Scheme-specific serialized report; empty when the request was
    /// absent or the scheme unrecognized.
    pub payload: String,
}

impl MetricsReport {
    /// Report with an empty payload, signaling "nothing to report" for a
    /// request the generator could not serve.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Well-known metrics reporting scheme identifiers.
pub mod schemes {
    /// 3GPP DASH QoE metrics reporting (TS 26.247). The one counter-style
    /// scheme: its telemetry is cumulative since the last report.
    pub const THREE_GPP_DASH_METRICS: &str = "urn:3GPP:ns:PSS:DASH:QM10";
}

/// Payload of [`MessageKind::TriggerPlayback`](crate::MessageKind::TriggerPlayback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPlayback {
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
}

/// Payload of [`MessageKind::QueryMetricsCapabilities`](crate::MessageKind::QueryMetricsCapabilities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetricsCapabilities {
    #[serde(default)]
    pub requests: Vec<MetricsRequest>,
}

/// Payload of [`MessageKind::ReportMetricsCapabilities`](crate::MessageKind::ReportMetricsCapabilities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetricsCapabilities {
    pub scheme_support: Vec<SchemeSupport>,
}

/// Payload of [`MessageKind::GetMetrics`](crate::MessageKind::GetMetrics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetMetrics {
    #[serde(default)]
    pub request: Option<MetricsRequest>,
}

/// Payload of [`MessageKind::ReportMetrics`](crate::MessageKind::ReportMetrics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub report: MetricsReport,
}

/// Payload of [`MessageKind::PlaybackStateChanged`](crate::MessageKind::PlaybackStateChanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateChanged {
    pub state: PlaybackState,
}

/// Payload of [`MessageKind::SetEndpoint`](crate::MessageKind::SetEndpoint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetEndpoint {
    pub url: String,
}

/// Payload of [`MessageKind::StartPlayback`](crate::MessageKind::StartPlayback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPlayback {
    pub entry: ServiceListEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&PlaybackState::ReadyPaused).unwrap(),
            "\"READY_PAUSED\""
        );
        assert_eq!(
            serde_json::to_string(&PlaybackState::Buffering).unwrap(),
            "\"BUFFERING\""
        );
    }

    #[test]
    fn content_type_uses_mime_strings() {
        assert_eq!(
            serde_json::to_string(&ContentType::Dash).unwrap(),
            "\"application/dash+xml\""
        );
        let parsed: ContentType = serde_json::from_str("\"video/mp2t\"").unwrap();
        assert_eq!(parsed, ContentType::Other);
    }

    #[test]
    fn entry_point_fields_are_camel_case() {
        let entry = EntryPoint {
            locator: "https://cdn.example.com/m.mpd".into(),
            content_type: ContentType::Dash,
            profiles: vec![],
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["contentType"], "application/dash+xml");
        assert_eq!(value["locator"], "https://cdn.example.com/m.mpd");
    }

    #[test]
    fn metrics_request_tolerates_missing_interval() {
        let req: MetricsRequest = serde_json::from_str(
            r#"{"scheme":"urn:3GPP:ns:PSS:DASH:QM10","configurationId":"cfg-1"}"#,
        )
        .unwrap();
        assert_eq!(req.scheme, schemes::THREE_GPP_DASH_METRICS);
        assert_eq!(req.configuration_id, "cfg-1");
        assert!(req.reporting_interval.is_none());
    }

    #[test]
    fn trigger_playback_defaults_to_no_entry_points() {
        let trigger: TriggerPlayback = serde_json::from_str("{}").unwrap();
        assert!(trigger.entry_points.is_empty());
    }
}

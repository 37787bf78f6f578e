//! Typed envelope model for the wire protocol.
//!
//! One envelope is one JSON object on the wire:
//!
//! ```json
//! {
//!   "event_id": "evt_01",
//!   "schema_version": "1.0",
//!   "type": "text-chunk",
//!   "timestamp": "2026-01-01T00:00:00Z",
//!   "sequence_number": 3,
//!   "data": { "text": "Hello" }
//! }
//! ```
//!
//! The `type` field selects a [`EventPayload`] variant and `data`
//! carries the variant body. Unrecognized types deserialize to
//! [`EventPayload::Unknown`] so a newer producer never breaks an older
//! consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One self-describing unit of the wire protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Producer-assigned unique identifier.
    pub event_id: String,
    /// Wire schema version, passed through without interpretation.
    pub schema_version: String,
    /// Producer-side emission time, advisory only.
    pub timestamp: String,
    /// Ordering key: strictly increasing per logical stream, from 0.
    pub sequence_number: u64,
    /// Typed payload, keyed by the wire `type` discriminator.
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Payload variants keyed by the wire `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum EventPayload {
    MessageStart(MessageStartData),
    TextChunk(TextChunkData),
    MessageEnd(MessageEndData),
    ResponseStart(ResponseStartData),
    ResponseComplete(ResponseCompleteData),
    StateDelta(StateDeltaData),
    ToolCallStart(ToolCallStartData),
    ToolCallResult(ToolCallResultData),
    ToolCallEnd(ToolCallEndData),
    Error(ErrorData),
    /// Liveness signal, carries no data and maps to no callback.
    Acknowledge,
    AnalysisComplete(AnalysisCompleteData),
    /// Forward-compatibility catch-all for types this consumer does not
    /// recognize. Ignored by dispatch.
    #[serde(other)]
    Unknown,
}

/// Payload of `message-start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStartData {
    pub message_id: String,
    /// Optional tag naming where the message originated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Payload of `text-chunk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunkData {
    pub text: String,
}

/// Payload of `message-end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEndData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

/// Payload of `response-start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseStartData {
    /// Producer confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Payload of `response-complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCompleteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Payload of `state-delta`: a versioned list of patch operations.
///
/// The core does not apply the patch generically; dispatch scans the
/// operations for tracked fields only (see the handler module).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDeltaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub operations: Vec<PatchOp>,
}

/// One JSON-Patch-like operation inside a `state-delta`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub op: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Payload of `tool-call-start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallStartData {
    pub call_id: String,
    pub name: String,
}

/// Payload of `tool-call-result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResultData {
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

/// Payload of `tool-call-end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallEndData {
    pub call_id: String,
}

/// Payload of `error`: a producer-reported failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    pub message: String,
}

/// Payload of `analysis-complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCompleteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileVector>,
}

/// Small fixed-shape profile record.
///
/// Deduplicated by full equality over all five fields before delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileVector {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

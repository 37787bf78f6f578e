//! Dispatch table: mapping from envelope payload to callback delivery.
//!
//! An exhaustive match over the payload union. Each arm extracts the
//! expected shape and invokes zero or one gate method; unknown types
//! fall through silently for forward compatibility. Handlers never
//! raise on missing optional fields.

use tracing::trace;

use super::callbacks::{MessageStarted, ResponseStarted, ToolCallUpdate};
use super::gate::CallbackGate;
use crate::codec::{Envelope, EventPayload};

/// Number of cells in the rendered confidence indicator.
const CONFIDENCE_CELLS: usize = 10;

/// Path suffix identifying the tracked confidence scalar in state
/// deltas. Operations targeting any other path are ignored here; the
/// core does not apply the patch list generically.
const CONFIDENCE_PATH_SUFFIX: &str = "/confidence";

/// Dispatch one envelope through the gate.
///
/// Called with envelopes already in sequence order; ordering is the
/// sequencer's concern, suppression is the gate's.
pub fn dispatch(envelope: &Envelope, gate: &mut CallbackGate) {
    match &envelope.payload {
        EventPayload::MessageStart(data) => {
            gate.message_started(MessageStarted {
                message_id: data.message_id.clone(),
                source: data.source.clone(),
            });
        }
        EventPayload::TextChunk(data) => gate.chunk(&data.text),
        // Bookkeeping only; completion is signaled by response-complete.
        EventPayload::MessageEnd(_) => {}
        EventPayload::ResponseStart(data) => {
            gate.response_started(ResponseStarted {
                confidence: data.confidence,
                rendered: render_confidence(data.confidence),
            });
        }
        EventPayload::ResponseComplete(data) => gate.completed(data),
        EventPayload::StateDelta(data) => {
            for operation in &data.operations {
                if !matches!(operation.op.as_str(), "replace" | "add") {
                    continue;
                }
                if !operation.path.ends_with(CONFIDENCE_PATH_SUFFIX) {
                    continue;
                }
                if let Some(value) = operation.value.as_ref().and_then(|v| v.as_f64()) {
                    gate.confidence_changed(value);
                }
            }
        }
        EventPayload::ToolCallStart(data) => {
            gate.tool_call(ToolCallUpdate::Start(data.clone()));
        }
        EventPayload::ToolCallResult(data) => {
            gate.tool_call(ToolCallUpdate::Result(data.clone()));
        }
        EventPayload::ToolCallEnd(data) => {
            gate.tool_call(ToolCallUpdate::End(data.clone()));
        }
        EventPayload::Error(data) => gate.fail(&data.message),
        // Liveness signal, no callback.
        EventPayload::Acknowledge => {}
        EventPayload::AnalysisComplete(data) => {
            if let Some(profile) = &data.profile {
                gate.profile_changed(profile);
            }
            gate.analysis_completed(data);
        }
        EventPayload::Unknown => {
            trace!(event_id = %envelope.event_id, "ignoring unrecognized event type");
        }
    }
}

/// Render a confidence value in `[0, 1]` as a fixed-width bar plus a
/// percentage. Out-of-range input is clamped.
pub fn render_confidence(value: f64) -> String {
    let clamped = value.clamp(0.0, 1.0);
    let filled = (clamped * CONFIDENCE_CELLS as f64).round() as usize;

    let mut rendered = String::with_capacity(CONFIDENCE_CELLS * 3 + 5);
    for cell in 0..CONFIDENCE_CELLS {
        rendered.push(if cell < filled { '█' } else { '░' });
    }
    rendered.push_str(&format!(" {:.0}%", clamped * 100.0));
    rendered
}

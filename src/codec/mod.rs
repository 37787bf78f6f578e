//! Codec module - envelope model and wire record encoding/decoding.
//!
//! - [`Envelope`] / [`EventPayload`] - the typed model of one wire unit
//! - [`EnvelopeCodec`] - one line of wire text to/from one envelope
//!
//! # Design
//!
//! The codec is a marker struct with static methods rather than a trait
//! object; the wire format is fixed at compile time. Decoding is
//! deliberately lenient: malformed records are logged and skipped so a
//! single bad line never aborts the stream.

mod envelope;
mod wire;

pub use envelope::{
    AnalysisCompleteData, Envelope, ErrorData, EventPayload, MessageEndData, MessageStartData,
    PatchOp, ProfileVector, ResponseCompleteData, ResponseStartData, StateDeltaData,
    TextChunkData, ToolCallEndData, ToolCallResultData, ToolCallStartData,
};
pub use wire::{EnvelopeCodec, RECORD_PREFIX};

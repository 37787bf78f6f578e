//! Wire record codec.
//!
//! One record is the recognized line prefix `data: ` followed by a JSON
//! envelope. Decoding is lenient by contract: a malformed record yields
//! `None` and a warning, never a stream error, so a single bad line
//! cannot abort an otherwise-healthy stream.

use tracing::warn;

use super::envelope::Envelope;
use crate::error::Result;

/// Recognized line prefix for event records.
pub const RECORD_PREFIX: &str = "data: ";

/// Longest slice of a rejected record included in log output.
const LOG_SNIPPET_LEN: usize = 120;

/// Codec for single wire records.
///
/// Marker struct with static methods; there is no per-record state.
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Decode one wire record into a typed envelope.
    ///
    /// Returns `None` (after logging) when the prefix is missing or the
    /// JSON payload does not parse.
    pub fn decode_record(record: &str) -> Option<Envelope> {
        let json = match record.strip_prefix(RECORD_PREFIX) {
            Some(rest) => rest,
            None => {
                warn!(
                    record = snippet(record),
                    "discarding record without recognized prefix"
                );
                return None;
            }
        };

        match serde_json::from_str::<Envelope>(json) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                warn!(
                    record = snippet(record),
                    error = %err,
                    "discarding malformed envelope"
                );
                None
            }
        }
    }

    /// Encode an envelope as one wire record (without the trailing
    /// newline or blank-line separator).
    pub fn encode_record(envelope: &Envelope) -> Result<String> {
        Ok(format!(
            "{RECORD_PREFIX}{}",
            serde_json::to_string(envelope)?
        ))
    }
}

fn snippet(record: &str) -> &str {
    if record.len() <= LOG_SNIPPET_LEN {
        return record;
    }
    let mut end = LOG_SNIPPET_LEN;
    while !record.is_char_boundary(end) {
        end -= 1;
    }
    &record[..end]
}

//! Integration tests for eventwire-client.
//!
//! These tests verify the integration between different modules:
//! line splitting, record decoding, sequencing, and gated dispatch,
//! without the network layer.

use std::sync::{Arc, Mutex};

use eventwire_client::codec::{
    Envelope, EnvelopeCodec, EventPayload, MessageStartData, PatchOp, ResponseCompleteData,
    ResponseStartData, StateDeltaData, TextChunkData,
};
use eventwire_client::handler::{dispatch, CallbackGate};
use eventwire_client::protocol::{LineSplitter, Sequencer};
use eventwire_client::StreamCallbacks;
use tokio_util::sync::CancellationToken;

fn envelope(seq: u64, payload: EventPayload) -> Envelope {
    Envelope {
        event_id: format!("evt_{seq}"),
        schema_version: "1.0".to_string(),
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        sequence_number: seq,
        payload,
    }
}

fn text_chunk(seq: u64, text: &str) -> Envelope {
    envelope(
        seq,
        EventPayload::TextChunk(TextChunkData {
            text: text.to_string(),
        }),
    )
}

/// Render envelopes as framed wire text: record, newline, blank line.
fn to_wire(envelopes: &[Envelope]) -> String {
    let mut wire = String::new();
    for envelope in envelopes {
        wire.push_str(&EnvelopeCodec::encode_record(envelope).unwrap());
        wire.push_str("\n\n");
    }
    wire
}

/// Test the full pipeline: wire text through splitter, codec, and
/// sequencer, collecting the released envelopes.
#[test]
fn test_wire_to_ordered_envelopes() {
    let envelopes = vec![
        text_chunk(2, "Third"),
        text_chunk(0, "First"),
        text_chunk(1, "Second"),
    ];
    let wire = to_wire(&envelopes);

    let mut splitter = LineSplitter::new();
    let mut sequencer = Sequencer::new();
    let mut released = Vec::new();

    // Feed the wire text in awkward 7-byte chunks.
    for chunk in wire.as_bytes().chunks(7) {
        for record in splitter.push(chunk) {
            let envelope = EnvelopeCodec::decode_record(&record).expect("well-formed record");
            released.extend(sequencer.add(envelope));
        }
    }

    let texts: Vec<String> = released
        .iter()
        .map(|e| match &e.payload {
            EventPayload::TextChunk(data) => data.text.clone(),
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect();
    assert_eq!(texts, vec!["First", "Second", "Third"]);
    assert!(splitter.is_empty());
    assert_eq!(sequencer.held_len(), 0);
}

/// A malformed line between two healthy records is skipped, and the
/// healthy ones still sequence correctly.
#[test]
fn test_malformed_line_between_records() {
    let mut wire = to_wire(&[text_chunk(1, "b")]);
    wire.push_str("data: {oops\n\n");
    wire.push_str(&to_wire(&[text_chunk(0, "a")]));

    let mut splitter = LineSplitter::new();
    let mut sequencer = Sequencer::new();
    let mut released = Vec::new();

    for record in splitter.push(wire.as_bytes()) {
        if let Some(envelope) = EnvelopeCodec::decode_record(&record) {
            released.extend(sequencer.add(envelope));
        }
    }

    let seqs: Vec<u64> = released.iter().map(|e| e.sequence_number).collect();
    assert_eq!(seqs, vec![0, 1]);
}

/// Full scenario through the gate: message lifecycle with deduplicated
/// confidence updates, arrivals reversed.
#[test]
fn test_end_to_end_dispatch_with_dedup() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let starts = log.clone();
    let chunks = log.clone();
    let confidences = log.clone();
    let completions = log.clone();
    let callbacks = StreamCallbacks::new()
        .on_message_started(move |update| {
            starts
                .lock()
                .unwrap()
                .push(format!("started:{}", update.message_id))
        })
        .on_chunk(move |text| chunks.lock().unwrap().push(format!("chunk:{text}")))
        .on_confidence_changed(move |value| {
            confidences
                .lock()
                .unwrap()
                .push(format!("confidence:{value}"))
        })
        .on_completed(move |_| completions.lock().unwrap().push("completed".to_string()));

    let delta = |seq: u64, value: f64| {
        envelope(
            seq,
            EventPayload::StateDelta(StateDeltaData {
                version: None,
                operations: vec![PatchOp {
                    op: "replace".to_string(),
                    path: "/confidence".to_string(),
                    value: Some(serde_json::json!(value)),
                }],
            }),
        )
    };

    let envelopes = vec![
        envelope(
            0,
            EventPayload::MessageStart(MessageStartData {
                message_id: "msg_1".to_string(),
                source: Some("chat".to_string()),
            }),
        ),
        envelope(
            1,
            EventPayload::ResponseStart(ResponseStartData { confidence: 0.5 }),
        ),
        delta(2, 0.5),
        text_chunk(3, "Hello"),
        delta(4, 0.5), // identical: deduplicated
        delta(5, 0.8),
        envelope(
            6,
            EventPayload::ResponseComplete(ResponseCompleteData {
                message_id: Some("msg_1".to_string()),
                confidence: Some(0.8),
            }),
        ),
    ];

    let token = CancellationToken::new();
    let mut gate = CallbackGate::new(callbacks, token);
    let mut sequencer = Sequencer::new();

    for arrival in envelopes.into_iter().rev() {
        for released in sequencer.add(arrival) {
            dispatch(&released, &mut gate);
        }
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "started:msg_1",
            "chunk:Hello",
            "confidence:0.5",
            "confidence:0.8",
            "completed",
        ]
    );
}

/// Cancelling between two already-sequenced envelopes stops delivery of
/// the second.
#[test]
fn test_cancellation_between_ready_envelopes() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let callbacks = StreamCallbacks::new().on_chunk(move |text| sink.lock().unwrap().push(text));

    let token = CancellationToken::new();
    let mut gate = CallbackGate::new(callbacks, token.clone());
    let mut sequencer = Sequencer::new();

    let ready: Vec<Envelope> = sequencer
        .add(text_chunk(0, "first"))
        .into_iter()
        .chain(sequencer.add(text_chunk(1, "second")))
        .collect();
    assert_eq!(ready.len(), 2);

    dispatch(&ready[0], &mut gate);
    token.cancel();
    dispatch(&ready[1], &mut gate);

    assert_eq!(*log.lock().unwrap(), vec!["first"]);
}

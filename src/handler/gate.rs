//! Dedup/interrupt gate around the consumer callbacks.
//!
//! Every delivery method checks the cancellation token first, per
//! invocation rather than per stream: cancellation can land between two
//! already-sequenced envelopes, and the later one must not reach the
//! consumer. Channels with natural "previous value" semantics
//! (confidence, profile) additionally suppress identical consecutive
//! deliveries.

use tokio_util::sync::CancellationToken;

use super::callbacks::{MessageStarted, ResponseStarted, StreamCallbacks, ToolCallUpdate};
use crate::codec::{AnalysisCompleteData, ProfileVector, ResponseCompleteData};

/// Fixed message reported when a stream is interrupted.
///
/// Distinct from transport failure messages so callers can special-case
/// "user cancelled" vs. "real failure".
pub const INTERRUPT_MESSAGE: &str = "stream interrupted";

/// Per-stream wrapper enforcing "no stale, duplicate, or
/// post-cancellation delivery".
///
/// Owned by the stream driver task; holds the last-delivered snapshots
/// the deduplicated channels compare against.
pub struct CallbackGate {
    callbacks: StreamCallbacks,
    token: CancellationToken,
    last_confidence: Option<f64>,
    last_profile: Option<ProfileVector>,
    terminal_reported: bool,
}

impl CallbackGate {
    /// Wrap a callback set with gate state bound to `token`.
    pub fn new(callbacks: StreamCallbacks, token: CancellationToken) -> Self {
        Self {
            callbacks,
            token,
            last_confidence: None,
            last_profile: None,
            terminal_reported: false,
        }
    }

    /// Whether success-path delivery is still allowed.
    fn open(&self) -> bool {
        !self.terminal_reported && !self.token.is_cancelled()
    }

    pub fn message_started(&mut self, update: MessageStarted) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.message_started {
            callback(update);
        }
    }

    /// Deliver a text chunk. Never deduplicated: repeated identical
    /// chunks are legitimate content.
    pub fn chunk(&mut self, text: &str) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.chunk {
            callback(text.to_string());
        }
    }

    pub fn response_started(&mut self, update: ResponseStarted) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.response_started {
            callback(update);
        }
    }

    pub fn completed(&mut self, data: &ResponseCompleteData) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.completed {
            callback(data.clone());
        }
    }

    /// Deliver a confidence change, suppressing an identical successive
    /// value.
    pub fn confidence_changed(&mut self, value: f64) {
        if !self.open() {
            return;
        }
        if self.last_confidence == Some(value) {
            return;
        }
        self.last_confidence = Some(value);
        if let Some(callback) = &self.callbacks.confidence_changed {
            callback(value);
        }
    }

    /// Deliver a profile change, suppressing a successive value equal in
    /// every field.
    pub fn profile_changed(&mut self, profile: &ProfileVector) {
        if !self.open() {
            return;
        }
        if self.last_profile.as_ref() == Some(profile) {
            return;
        }
        self.last_profile = Some(profile.clone());
        if let Some(callback) = &self.callbacks.profile_changed {
            callback(profile.clone());
        }
    }

    pub fn analysis_completed(&mut self, data: &AnalysisCompleteData) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.analysis_completed {
            callback(data.clone());
        }
    }

    pub fn tool_call(&mut self, update: ToolCallUpdate) {
        if !self.open() {
            return;
        }
        if let Some(callback) = &self.callbacks.tool_call {
            callback(update);
        }
    }

    /// Report a failure (producer-reported or transport-level).
    ///
    /// Reports at most once per stream; afterwards all delivery is
    /// suppressed and the cancellation token is tripped so the read
    /// loop stops promptly.
    pub fn fail(&mut self, message: &str) {
        if self.terminal_reported {
            return;
        }
        self.terminal_reported = true;
        if let Some(callback) = &self.callbacks.error {
            callback(message.to_string());
        }
        self.token.cancel();
    }

    /// Report consumer-initiated or transport-detected cancellation.
    ///
    /// Idempotent, and a no-op if a failure was already reported. Uses
    /// the fixed [`INTERRUPT_MESSAGE`].
    pub fn interrupted(&mut self) {
        if self.terminal_reported {
            return;
        }
        self.terminal_reported = true;
        if let Some(callback) = &self.callbacks.error {
            callback(INTERRUPT_MESSAGE.to_string());
        }
        self.token.cancel();
    }

    /// Whether a terminal condition (failure or interrupt) has been
    /// reported.
    pub fn is_terminal(&self) -> bool {
        self.terminal_reported
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_gate(token: CancellationToken) -> (CallbackGate, Arc<Mutex<Vec<String>>>) {
        let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let chunks = log.clone();
        let confidences = log.clone();
        let profiles = log.clone();
        let errors = log.clone();
        let completions = log.clone();
        let callbacks = StreamCallbacks::new()
            .on_chunk(move |text| chunks.lock().unwrap().push(format!("chunk:{text}")))
            .on_confidence_changed(move |value| {
                confidences.lock().unwrap().push(format!("confidence:{value}"))
            })
            .on_profile_changed(move |profile| {
                profiles
                    .lock()
                    .unwrap()
                    .push(format!("profile:{}", profile.openness))
            })
            .on_completed(move |_| completions.lock().unwrap().push("completed".to_string()))
            .on_error(move |message| errors.lock().unwrap().push(format!("error:{message}")));

        (CallbackGate::new(callbacks, token), log)
    }

    fn profile(openness: f64) -> ProfileVector {
        ProfileVector {
            openness,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }

    #[test]
    fn test_confidence_dedup() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.confidence_changed(0.8);
        gate.confidence_changed(0.8);
        gate.confidence_changed(0.9);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["confidence:0.8", "confidence:0.9"]
        );
    }

    #[test]
    fn test_confidence_dedup_is_consecutive_only() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.confidence_changed(0.8);
        gate.confidence_changed(0.9);
        gate.confidence_changed(0.8);

        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_profile_dedup_full_equality() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.profile_changed(&profile(0.1));
        gate.profile_changed(&profile(0.1));
        gate.profile_changed(&profile(0.2));

        assert_eq!(*log.lock().unwrap(), vec!["profile:0.1", "profile:0.2"]);
    }

    #[test]
    fn test_chunks_never_deduplicated() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.chunk("same");
        gate.chunk("same");

        assert_eq!(*log.lock().unwrap(), vec!["chunk:same", "chunk:same"]);
    }

    #[test]
    fn test_post_cancellation_silence() {
        let token = CancellationToken::new();
        let (mut gate, log) = recording_gate(token.clone());

        gate.chunk("before");
        token.cancel();
        gate.chunk("after");
        gate.confidence_changed(1.0);
        gate.completed(&ResponseCompleteData {
            message_id: None,
            confidence: None,
        });

        assert_eq!(*log.lock().unwrap(), vec!["chunk:before"]);
    }

    #[test]
    fn test_interrupted_reports_fixed_message_once() {
        let token = CancellationToken::new();
        let (mut gate, log) = recording_gate(token.clone());

        token.cancel();
        gate.interrupted();
        gate.interrupted();

        assert_eq!(
            *log.lock().unwrap(),
            vec![format!("error:{INTERRUPT_MESSAGE}")]
        );
        assert!(gate.is_terminal());
    }

    #[test]
    fn test_fail_suppresses_later_interrupt() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.fail("boom");
        gate.interrupted();

        assert_eq!(*log.lock().unwrap(), vec!["error:boom"]);
    }

    #[test]
    fn test_fail_trips_token() {
        let token = CancellationToken::new();
        let (mut gate, _log) = recording_gate(token.clone());

        gate.fail("boom");

        assert!(token.is_cancelled());
    }

    #[test]
    fn test_no_success_delivery_after_fail() {
        let (mut gate, log) = recording_gate(CancellationToken::new());

        gate.fail("boom");
        gate.chunk("late");

        assert_eq!(*log.lock().unwrap(), vec!["error:boom"]);
    }
}

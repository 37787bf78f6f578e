//! Consumer-facing callback surface.
//!
//! A fixed set of named, optional callback slots, one per logical event
//! category. Register only the slots you need; unregistered slots are
//! no-ops. All slots are wrapped by the dedup/interrupt gate before any
//! envelope reaches them, so a consumer never observes delivery after
//! cancellation.
//!
//! # Example
//!
//! ```
//! use eventwire_client::StreamCallbacks;
//!
//! let callbacks = StreamCallbacks::new()
//!     .on_chunk(|text| print!("{text}"))
//!     .on_error(|message| eprintln!("stream error: {message}"));
//! ```

use std::sync::Arc;

use crate::codec::{
    AnalysisCompleteData, ProfileVector, ResponseCompleteData, ToolCallEndData,
    ToolCallResultData, ToolCallStartData,
};

/// One lifecycle update of a producer-side tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallUpdate {
    Start(ToolCallStartData),
    Result(ToolCallResultData),
    End(ToolCallEndData),
}

type Slot<Args> = Option<Arc<dyn Fn(Args) + Send + Sync>>;

/// Named optional callback slots, one per logical event category.
///
/// `Clone` is cheap (slots are `Arc`ed); each open stream gets its own
/// gate state around a clone of this set.
#[derive(Clone, Default)]
pub struct StreamCallbacks {
    pub(crate) message_started: Slot<MessageStarted>,
    pub(crate) chunk: Slot<String>,
    pub(crate) response_started: Slot<ResponseStarted>,
    pub(crate) completed: Slot<ResponseCompleteData>,
    pub(crate) error: Slot<String>,
    pub(crate) confidence_changed: Slot<f64>,
    pub(crate) profile_changed: Slot<ProfileVector>,
    pub(crate) analysis_completed: Slot<AnalysisCompleteData>,
    pub(crate) tool_call: Slot<ToolCallUpdate>,
}

/// Payload of the "message started" slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageStarted {
    pub message_id: String,
    pub source: Option<String>,
}

/// Payload of the "response started" slot: the raw confidence value and
/// its rendered indicator form.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseStarted {
    pub confidence: f64,
    pub rendered: String,
}

impl StreamCallbacks {
    /// Create an empty callback set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A message began; receives the message id and optional source tag.
    pub fn on_message_started(
        mut self,
        callback: impl Fn(MessageStarted) + Send + Sync + 'static,
    ) -> Self {
        self.message_started = Some(Arc::new(callback));
        self
    }

    /// A text chunk arrived. Chunks are never deduplicated.
    pub fn on_chunk(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.chunk = Some(Arc::new(callback));
        self
    }

    /// The response began; receives the raw confidence value and its
    /// rendered indicator.
    pub fn on_response_started(
        mut self,
        callback: impl Fn(ResponseStarted) + Send + Sync + 'static,
    ) -> Self {
        self.response_started = Some(Arc::new(callback));
        self
    }

    /// The response completed. Never invoked on a cancelled stream.
    pub fn on_completed(
        mut self,
        callback: impl Fn(ResponseCompleteData) + Send + Sync + 'static,
    ) -> Self {
        self.completed = Some(Arc::new(callback));
        self
    }

    /// A failure or interruption was reported. Invoked at most once per
    /// stream; see [`crate::handler::INTERRUPT_MESSAGE`] for the fixed
    /// cancellation message.
    pub fn on_error(mut self, callback: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(callback));
        self
    }

    /// The tracked confidence value changed. Deduplicated: identical
    /// consecutive values are delivered once.
    pub fn on_confidence_changed(
        mut self,
        callback: impl Fn(f64) + Send + Sync + 'static,
    ) -> Self {
        self.confidence_changed = Some(Arc::new(callback));
        self
    }

    /// The profile vector changed. Deduplicated by full equality over
    /// all fields.
    pub fn on_profile_changed(
        mut self,
        callback: impl Fn(ProfileVector) + Send + Sync + 'static,
    ) -> Self {
        self.profile_changed = Some(Arc::new(callback));
        self
    }

    /// An analysis pass completed.
    pub fn on_analysis_completed(
        mut self,
        callback: impl Fn(AnalysisCompleteData) + Send + Sync + 'static,
    ) -> Self {
        self.analysis_completed = Some(Arc::new(callback));
        self
    }

    /// A producer-side tool invocation started, produced a result, or
    /// ended.
    pub fn on_tool_call(
        mut self,
        callback: impl Fn(ToolCallUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.tool_call = Some(Arc::new(callback));
        self
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("message_started", &self.message_started.is_some())
            .field("chunk", &self.chunk.is_some())
            .field("response_started", &self.response_started.is_some())
            .field("completed", &self.completed.is_some())
            .field("error", &self.error.is_some())
            .field("confidence_changed", &self.confidence_changed.is_some())
            .field("profile_changed", &self.profile_changed.is_some())
            .field("analysis_completed", &self.analysis_completed.is_some())
            .field("tool_call", &self.tool_call.is_some())
            .finish()
    }
}

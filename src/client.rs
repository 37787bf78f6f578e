//! Client builder and stream driver.
//!
//! [`ClientBuilder`] provides a fluent API for configuring the endpoint
//! and stream settings. The [`Client`] opens envelope streams:
//! 1. Issue the POST and obtain the chunked response body
//! 2. Spawn the driver task (split → decode → sequence → dispatch)
//! 3. Return a [`StreamHandle`] whose `abort()` stops both future
//!    processing and the in-flight network read
//!
//! # Example
//!
//! ```ignore
//! use eventwire_client::{Client, StreamCallbacks, StreamRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder("https://producer.example/api").build();
//!
//!     let callbacks = StreamCallbacks::new()
//!         .on_chunk(|text| print!("{text}"))
//!         .on_error(|message| eprintln!("stream error: {message}"));
//!
//!     let handle = client
//!         .open_stream(&StreamRequest::new("hello"), callbacks)
//!         .await?;
//!     handle.join().await;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::codec::EnvelopeCodec;
use crate::error::Result;
use crate::handler::{dispatch, CallbackGate, StreamCallbacks};
use crate::protocol::{LineSplitter, Sequencer, DEFAULT_SEQUENCER_CAPACITY};
use crate::retry::{default_should_retry, with_retry, with_timeout, RetryConfig};
use crate::transport::HttpTransport;

/// Path the envelope stream is served from, relative to the base URL.
pub const STREAM_PATH: &str = "stream";

/// Default deadline applied to single-shot requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body for opening a stream: the caller's input plus a
/// snapshot of its current state.
#[derive(Debug, Clone, Serialize)]
pub struct StreamRequest {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

impl StreamRequest {
    /// Build a request with input only.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            state: None,
        }
    }

    /// Attach a state snapshot.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// Terminal outcome of a stream driver run.
///
/// `Completed` and `Aborted` are both clean exits from the driver's
/// perspective; `Failed` means an I/O or transport error was reported
/// through the error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Aborted,
    Failed,
}

/// Builder for configuring and creating an eventwire client.
pub struct ClientBuilder {
    base_url: String,
    http_client: Option<reqwest::Client>,
    sequencer_capacity: usize,
    retry: RetryConfig,
    request_timeout: Duration,
}

impl ClientBuilder {
    /// Create a builder for the given producer base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: None,
            sequencer_capacity: DEFAULT_SEQUENCER_CAPACITY,
            retry: RetryConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Use a caller-configured HTTP client (proxies, headers, TLS).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the sequencing buffer capacity.
    ///
    /// Bounds the number of out-of-order envelopes held back; on
    /// overflow the oldest quarter is evicted. Default: 100.
    pub fn sequencer_capacity(mut self, capacity: usize) -> Self {
        self.sequencer_capacity = capacity;
        self
    }

    /// Set the retry schedule for single-shot requests.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Set the per-attempt deadline for single-shot requests.
    ///
    /// Default: 30 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let transport = match self.http_client {
            Some(client) => HttpTransport::with_client(client, self.base_url),
            None => HttpTransport::new(self.base_url),
        };
        Client {
            transport,
            sequencer_capacity: self.sequencer_capacity,
            retry: self.retry,
            request_timeout: self.request_timeout,
        }
    }
}

/// A client for one producer endpoint.
///
/// Streams opened through one client are independent: each gets its own
/// sequencer, gate state, and cancellation token. Only the pooled HTTP
/// connection is shared.
pub struct Client {
    transport: HttpTransport,
    sequencer_capacity: usize,
    retry: RetryConfig,
    request_timeout: Duration,
}

impl Client {
    /// Create a client builder.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Open an envelope stream and spawn its driver task.
    ///
    /// Returns once the transport request has been issued and the
    /// response stream obtained; envelope processing continues in the
    /// background until completion, failure, or an `abort()` on the
    /// returned handle.
    pub async fn open_stream(
        &self,
        request: &StreamRequest,
        callbacks: StreamCallbacks,
    ) -> Result<StreamHandle> {
        let chunks = self.transport.open_stream(STREAM_PATH, request).await?;

        let token = CancellationToken::new();
        let gate = CallbackGate::new(callbacks, token.clone());
        let sequencer = Sequencer::with_capacity(self.sequencer_capacity);

        let driver_token = token.clone();
        let task =
            tokio::spawn(async move { drive_stream(chunks, sequencer, gate, driver_token).await });

        Ok(StreamHandle { token, task })
    }

    /// Single-shot JSON call with the configured timeout and retry
    /// schedule applied.
    pub async fn request<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        with_retry(&self.retry, default_should_retry, || {
            with_timeout(
                self.transport.post_json(path, body),
                self.request_timeout,
                path,
            )
        })
        .await
    }

    /// The transport this client issues requests through.
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

/// Handle to one open stream.
///
/// Dropping the handle does not cancel the stream; call
/// [`StreamHandle::abort`] to interrupt it.
pub struct StreamHandle {
    token: CancellationToken,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    /// Request cancellation.
    ///
    /// Idempotent. Stops future callback delivery immediately and
    /// releases a read currently blocked on the network rather than
    /// waiting for a chunk that may never arrive.
    pub fn abort(&self) {
        self.token.cancel();
    }

    /// A clonable handle that can interrupt this stream without owning
    /// it, e.g. from the task that is not awaiting [`StreamHandle::join`].
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            token: self.token.clone(),
        }
    }

    /// Whether the driver task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the driver to finish and return its outcome.
    pub async fn join(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            // A panicked driver is a bug; surface it as a failure rather
            // than poisoning the caller.
            Err(_) => StreamOutcome::Failed,
        }
    }
}

/// Clonable interruptor for a stream whose [`StreamHandle`] is owned
/// elsewhere.
#[derive(Clone)]
pub struct InterruptHandle {
    token: CancellationToken,
}

impl InterruptHandle {
    /// Request cancellation. Idempotent.
    pub fn abort(&self) {
        self.token.cancel();
    }
}

/// The stream read loop: transport chunks in, gated callbacks out.
///
/// Phase machine: open until the transport ends (`Completed`), the
/// token trips (`Aborted`), or a read fails (`Failed`). Cancellation is
/// observed at the top of every iteration, while racing the pending
/// read, and per-callback inside the gate.
async fn drive_stream<S, E>(
    mut chunks: S,
    mut sequencer: Sequencer,
    mut gate: CallbackGate,
    token: CancellationToken,
) -> StreamOutcome
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut splitter = LineSplitter::new();
    let mut processed_chunks: u64 = 0;

    let outcome = loop {
        if token.is_cancelled() {
            break StreamOutcome::Aborted;
        }

        let chunk = tokio::select! {
            _ = token.cancelled() => break StreamOutcome::Aborted,
            chunk = chunks.next() => chunk,
        };

        match chunk {
            None => break StreamOutcome::Completed,
            Some(Ok(bytes)) => {
                processed_chunks += 1;
                for record in splitter.push(&bytes) {
                    process_record(&record, &mut sequencer, &mut gate);
                }
            }
            Some(Err(error)) => {
                // An abort can surface as a failed in-flight read; keep
                // the two outcomes distinct.
                if token.is_cancelled() {
                    break StreamOutcome::Aborted;
                }
                gate.fail(&error.to_string());
                break StreamOutcome::Failed;
            }
        }
    };

    match outcome {
        StreamOutcome::Completed => {
            if let Some(record) = splitter.finish() {
                process_record(&record, &mut sequencer, &mut gate);
            }
            // Best-effort delivery of whatever never got unblocked.
            for envelope in sequencer.flush() {
                dispatch(&envelope, &mut gate);
            }
        }
        // Buffered-but-undelivered envelopes are discarded: no flush
        // after an interrupt.
        StreamOutcome::Aborted => gate.interrupted(),
        // Already reported through the gate.
        StreamOutcome::Failed => {}
    }

    debug!(processed_chunks, ?outcome, "stream driver finished");
    outcome
}

fn process_record(record: &str, sequencer: &mut Sequencer, gate: &mut CallbackGate) {
    if let Some(envelope) = EnvelopeCodec::decode_record(record) {
        for released in sequencer.add(envelope) {
            dispatch(&released, gate);
        }
    }
}

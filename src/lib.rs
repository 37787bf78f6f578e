//! # eventwire-client
//!
//! Rust client SDK for consuming ordered, typed JSON event streams.
//!
//! The producer emits envelopes over a chunked `text/event-stream`
//! response; the network may fragment records and deliver them out of
//! order. This crate restores strict sequence order, suppresses
//! duplicate state notifications, and delivers each event exactly once
//! to a set of consumer callbacks, none of them after cancellation.
//!
//! ## Architecture
//!
//! - **Transport** (`transport`): reqwest-backed stream open and
//!   single-shot JSON calls
//! - **Framing** (`protocol`): line splitting across chunk boundaries,
//!   sequence reconstruction under a bounded memory budget
//! - **Codec** (`codec`): one wire record to/from one typed envelope
//! - **Handlers** (`handler`): dispatch table plus the dedup/interrupt
//!   gate around the consumer callbacks
//! - **Resilience** (`retry`): timeout race and exponential backoff
//!   with jitter for the non-streaming path
//!
//! ## Example
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
//!         .on_confidence_changed(|value| eprintln!("confidence: {value}"));
//!
//!     let handle = client
//!         .open_stream(&StreamRequest::new("hello"), callbacks)
//!         .await?;
//!
//!     // handle.abort() interrupts the stream at any point.
//!     handle.join().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod retry;
pub mod transport;

mod client;

pub use client::{
    Client, ClientBuilder, InterruptHandle, StreamHandle, StreamOutcome, StreamRequest,
    DEFAULT_REQUEST_TIMEOUT, STREAM_PATH,
};
pub use error::{EventwireError, Result};
pub use handler::{
    MessageStarted, ResponseStarted, StreamCallbacks, ToolCallUpdate, INTERRUPT_MESSAGE,
};
pub use retry::{default_should_retry, with_retry, with_timeout, RetryConfig};

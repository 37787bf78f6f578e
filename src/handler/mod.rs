//! Handler layer: callback slots, the dedup/interrupt gate, and the
//! dispatch table translating envelopes into callback invocations.

mod callbacks;
mod dispatch;
mod gate;

pub use callbacks::{MessageStarted, ResponseStarted, StreamCallbacks, ToolCallUpdate};
pub use dispatch::{dispatch, render_confidence};
pub use gate::{CallbackGate, INTERRUPT_MESSAGE};

//! Progress stream protocol
//!
//! Node lifecycle transitions become [`StreamEvent`]s with a stable `id`
//! (the node's url hash), an event type, and a JSON payload. Events are
//! pushed through an [`EventEmitter`] and framed for the client by
//! [`StreamFormat`].

mod emitter;
mod event;
mod format;

pub use emitter::EventEmitter;
pub use event::{
    EventKind, FailurePayload, ProcessingPayload, RenderPayload, StreamEvent, BEGIN_ID,
    DEFAULT_RETRY_MS, END_ID,
};
pub use format::StreamFormat;

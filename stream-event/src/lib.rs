//! Stream event protocol: type + payload + envelope.
//!
//! This crate defines the wire shape of a single orchestrator stream event and
//! envelope injection. It does not depend on tandem; the core bridges its
//! internal events into [`ProtocolEvent`] and calls [`to_json`].
//!
//! Every stream a client observes is a sequence of newline-delimited JSON
//! objects, each with a `type` field and event-specific payload, and always
//! terminates with exactly one `stream_complete` event.

pub mod envelope;
pub mod event;

pub use envelope::{to_json, Envelope, EnvelopeState};
pub use event::{ErrorKind, PlanUpdateAction, ProtocolEvent};

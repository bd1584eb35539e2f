//! Leveled diagnostic messages for the crush cache.
//!
//! Components report what they decided and why through [`Message`]s pushed
//! into a [`DiagnosticSink`]. The sink only records; it never feeds back into
//! cache decisions. Every message is also forwarded to `tracing` so a host
//! process with a subscriber installed sees the same stream.

#![warn(missing_docs)]

pub mod message;
pub mod severity;
pub mod sink;

pub use message::Message;
pub use severity::Severity;
pub use sink::DiagnosticSink;

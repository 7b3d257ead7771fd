//! Adapters for the domain ports: the tokio clock, the HTTP status source and
//! event-stream connector, both transports, and in-memory doubles.

pub mod clock;
pub mod http;
pub mod in_memory;
pub mod poll;
pub mod push;
pub mod sse;

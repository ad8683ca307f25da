//! Chainpipe — a pluggable chat pipe for a host chat runtime.
//!
//! One request-handling function: forward the latest user message through a
//! fixed prompt chain (system prompt → model call → text extraction) and
//! append the reply to the conversation, emitting throttled status events
//! back to the host UI along the way.
//!
//! See `DESIGN.md` for the full design notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod chain;
pub mod config;
pub mod events;
pub mod logging;
pub mod pipe;
pub mod providers;
pub mod status;

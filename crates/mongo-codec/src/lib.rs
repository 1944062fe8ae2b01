//! # mongo-codec
//!
//! Async framing layer for wire protocol messages.
//!
//! This crate turns a raw byte stream into whole messages and back, and
//! wraps the stream in a [`Transport`] that enforces per-operation
//! deadlines and closes itself on any failure.
//!
//! ## Architecture
//!
//! ```text
//! TCP Stream → MessageCodec (framing) → Transport (deadlines, close-on-error) → Client
//! ```
//!
//! ### Failure policy
//!
//! Once a send or receive fails, times out, or is abandoned by dropping its
//! future, the stream position is unknown. The transport closes rather than
//! risk pairing a later request with a stale reply.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod frame_codec;
pub mod transport;

pub use error::CodecError;
pub use frame_codec::{Frame, MessageCodec};
pub use transport::Transport;

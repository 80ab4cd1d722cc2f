//! Selfplay Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the selfplay coordinator
//! and its workers.
//!
//! # Overview
//!
//! - **Protocol**: request/response schemas exchanged between worker and coordinator
//! - **Digest**: content hashing used to address network artifacts
//! - **Codec**: gzip framing of network artifacts on the wire
//! - **Logging**: tracing subscriber setup shared by both binaries
//!
//! # Example
//!
//! ```no_run
//! use selfplay_common::{codec, digest, Result};
//!
//! fn address_of(upload: &[u8]) -> Result<String> {
//!     let weights = codec::gunzip(upload)?;
//!     Ok(digest::sha256_hex(&weights))
//! }
//! ```

pub mod codec;
pub mod digest;
pub mod error;
pub mod logging;
pub mod protocol;

// Re-export commonly used types
pub use error::{Result, SelfplayError};

//! Coordinator client module
//!
//! HTTP client speaking the worker protocol of the selfplay coordinator.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{ApiClient, GameUpload};
pub use types::*;

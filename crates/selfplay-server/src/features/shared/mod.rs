//! Shared utilities for feature modules
//!
//! - **error_helpers**: Database constraint error handling
//! - **form**: Urlencoded forms that tolerate a missing body
//! - **multipart**: Typed access to multipart upload forms
//! - **test_helpers**: Fixtures for unit tests (test-only)

pub mod error_helpers;
pub mod form;
pub mod multipart;

#[cfg(test)]
pub mod test_helpers;

pub use error_helpers::{is_unique_violation, map_unique_violation};
pub use form::LenientForm;
pub use multipart::{MultipartError, MultipartForm};

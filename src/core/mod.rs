//! Core types for tplgen
//!
//! This module holds the error taxonomy shared by every pipeline stage and the
//! user-facing error presentation used by the CLI.
//!
//! # Error Management
//!
//! - [`TplgenError`] - Enumerated error types covering every failure mode
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error into a displayable context
//!
//! # Examples
//!
//! ```rust
//! use tplgen_cli::core::{TplgenError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(TplgenError::ManifestNotFound.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, TplgenError, user_friendly_error};

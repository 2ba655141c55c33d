//! Cross-cutting utilities.
//!
//! - [`fs`]: atomic output writes and path normalization
//! - [`suggest`]: close-name suggestions attached to lookup errors

pub mod fs;
pub mod suggest;

pub use fs::{atomic_write, ensure_dir, normalize_path, resolve_against, safe_write};
pub use suggest::similar_names;

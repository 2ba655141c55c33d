//! Integration test suite for tplgen
//!
//! End-to-end tests driving the library against throwaway projects, and the
//! `tplgen` binary through `assert_cmd`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generation**: Full pipeline runs through [`tplgen_cli::generator::Generator`]
//! - **dependencies**: Dependency narrowing and resolution through the manifest
//! - **library**: Controllers compiled by `rustc` and loaded as dynamic libraries
//! - **cli**: Binary behavior, exit codes and output

mod cli;
mod dependencies;
mod generation;
mod library;

//! Error handling for tplgen
//!
//! This module provides the error taxonomy for the generation pipeline and
//! user-friendly error reporting for the CLI. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`TplgenError`] - Enumerated error types for every failure mode
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! # Error Categories
//!
//! - **Controller resolution**: [`TplgenError::TypeNotFound`], [`TplgenError::LoadError`],
//!   [`TplgenError::CompileFailure`]
//! - **Controller contract**: [`TplgenError::MethodNotFound`], [`TplgenError::ContractViolation`]
//! - **Controller execution**: [`TplgenError::InstantiationFailure`],
//!   [`TplgenError::InvocationFailure`], [`TplgenError::NullResult`],
//!   [`TplgenError::NonStringKey`]
//! - **Rendering and output**: [`TplgenError::TemplateNotFound`],
//!   [`TplgenError::RenderFailure`], [`TplgenError::OutputWriteFailure`]
//! - **Configuration**: [`TplgenError::ManifestNotFound`], [`TplgenError::ManifestParseError`],
//!   [`TplgenError::ManifestValidationError`], [`TplgenError::DependencyResolutionFailed`]
//!
//! Only [`TplgenError::TypeNotFound`] is ever recovered from, and only once: the
//! pipeline compiles the controller and retries resolution. Every other error
//! fails the generation unit.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tplgen_cli::core::{TplgenError, user_friendly_error};
//!
//! let error = TplgenError::NullResult {
//!     type_name: "com.example.Greeting".to_string(),
//!     method: "data".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for tplgen operations.
///
/// Controller-stage variants carry the controller's type and method names so
/// that a failed unit can be traced back to the configuration entry that
/// caused it.
#[derive(Error, Debug)]
pub enum TplgenError {
    /// The controller type could not be located in any classpath root.
    ///
    /// Before compilation this is recoverable; it surfaces as an error only when
    /// compilation is disabled for the controller or the type is still missing
    /// after the single compile attempt.
    #[error("{}", type_not_found_message(.type_name, .method, .after_compile))]
    TypeNotFound {
        /// Fully-qualified controller type name
        type_name: String,
        /// Configured method name
        method: String,
        /// Whether a compile attempt already ran before this failure
        after_compile: bool,
    },

    /// A classpath root or controller library could not be read or loaded
    #[error("Unable to load controller {type_name}.{method}: {reason}")]
    LoadError {
        /// Fully-qualified controller type name
        type_name: String,
        /// Configured method name
        method: String,
        /// What went wrong while loading
        reason: String,
    },

    /// No zero-argument method with the configured name exists on the type
    #[error("No zero-argument method '{method}' found on controller {type_name}")]
    MethodNotFound {
        /// Fully-qualified controller type name
        type_name: String,
        /// Configured method name
        method: String,
        /// Similarly named methods declared by the type
        suggestions: Vec<String>,
    },

    /// The method's declared return type is not assignable to a key/value map
    #[error(
        "The return type of the method {type_name}.{method} was not a key/value map (declared: {declared})"
    )]
    ContractViolation {
        /// Fully-qualified controller type name
        type_name: String,
        /// Configured method name
        method: String,
        /// Declared return type of the method
        declared: String,
    },

    /// The controller instance could not be constructed
    #[error("Unable to instantiate controller {type_name}: {reason}")]
    InstantiationFailure {
        /// Fully-qualified controller type name
        type_name: String,
        /// Method whose invocation required the instance
        method: String,
        /// Failure reported by the constructor
        reason: String,
    },

    /// The controller method failed while running
    #[error("Unable to invoke controller: {type_name}.{method} ({reason})")]
    InvocationFailure {
        /// Fully-qualified controller type name
        type_name: String,
        /// Invoked method
        method: String,
        /// Failure reported by controller code
        reason: String,
    },

    /// The controller method returned no value at all
    #[error("The result invoking {type_name}.{method} was null")]
    NullResult {
        /// Fully-qualified controller type name
        type_name: String,
        /// Invoked method
        method: String,
    },

    /// The returned map contains a key that is not a string
    #[error("A non-String key of type {key_type} was found in the {type_name}.{method} results")]
    NonStringKey {
        /// Fully-qualified controller type name
        type_name: String,
        /// Invoked method
        method: String,
        /// Runtime type of the offending key
        key_type: String,
    },

    /// The compiler service failed to compile the controller source unit
    #[error("Failed to compile controller {type_name}.{method} from {source_unit}")]
    CompileFailure {
        /// Fully-qualified controller type name
        type_name: String,
        /// Configured method name
        method: String,
        /// Relative source unit path handed to the compiler
        source_unit: String,
        /// Compiler output or failure reason
        reason: String,
    },

    /// The configured template could not be found
    #[error("Template '{name}' not found in {directory}")]
    TemplateNotFound {
        /// Logical template name
        name: String,
        /// Template directory that was searched
        directory: String,
        /// Similarly named templates present in the directory
        suggestions: Vec<String>,
    },

    /// The template engine rejected the template or failed while rendering
    #[error("Unable to render template '{template}': {reason}")]
    RenderFailure {
        /// Logical template name
        template: String,
        /// Engine error message
        reason: String,
    },

    /// The rendered output could not be written
    #[error("Unable to write output file: {path} ({reason})")]
    OutputWriteFailure {
        /// Output file path
        path: String,
        /// I/O failure description
        reason: String,
    },

    /// Manifest file (tplgen.toml) not found
    #[error("Manifest file tplgen.toml not found in current directory or any parent directory")]
    ManifestNotFound,

    /// Manifest parsing error
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Path to the manifest file that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// Manifest content is inconsistent
    #[error("Manifest validation failed: {reason}")]
    ManifestValidationError {
        /// What is wrong with the manifest
        reason: String,
    },

    /// The project's dependency graph could not be resolved
    #[error("Dependency resolution failed: {reason}")]
    DependencyResolutionFailed {
        /// What prevented resolution
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

fn type_not_found_message(type_name: &str, method: &str, after_compile: &bool) -> String {
    if *after_compile {
        format!(
            "Unable to resolve controller {type_name}.{method}: The class {type_name} is still not in the classpath after compiling it"
        )
    } else {
        format!(
            "Unable to resolve controller {type_name}.{method}: The class {type_name} is not in the classpath, and compilation is not enabled"
        )
    }
}

impl Clone for TplgenError {
    fn clone(&self) -> Self {
        match self {
            Self::TypeNotFound {
                type_name,
                method,
                after_compile,
            } => Self::TypeNotFound {
                type_name: type_name.clone(),
                method: method.clone(),
                after_compile: *after_compile,
            },
            Self::LoadError {
                type_name,
                method,
                reason,
            } => Self::LoadError {
                type_name: type_name.clone(),
                method: method.clone(),
                reason: reason.clone(),
            },
            Self::MethodNotFound {
                type_name,
                method,
                suggestions,
            } => Self::MethodNotFound {
                type_name: type_name.clone(),
                method: method.clone(),
                suggestions: suggestions.clone(),
            },
            Self::ContractViolation {
                type_name,
                method,
                declared,
            } => Self::ContractViolation {
                type_name: type_name.clone(),
                method: method.clone(),
                declared: declared.clone(),
            },
            Self::InstantiationFailure {
                type_name,
                method,
                reason,
            } => Self::InstantiationFailure {
                type_name: type_name.clone(),
                method: method.clone(),
                reason: reason.clone(),
            },
            Self::InvocationFailure {
                type_name,
                method,
                reason,
            } => Self::InvocationFailure {
                type_name: type_name.clone(),
                method: method.clone(),
                reason: reason.clone(),
            },
            Self::NullResult {
                type_name,
                method,
            } => Self::NullResult {
                type_name: type_name.clone(),
                method: method.clone(),
            },
            Self::NonStringKey {
                type_name,
                method,
                key_type,
            } => Self::NonStringKey {
                type_name: type_name.clone(),
                method: method.clone(),
                key_type: key_type.clone(),
            },
            Self::CompileFailure {
                type_name,
                method,
                source_unit,
                reason,
            } => Self::CompileFailure {
                type_name: type_name.clone(),
                method: method.clone(),
                source_unit: source_unit.clone(),
                reason: reason.clone(),
            },
            Self::TemplateNotFound {
                name,
                directory,
                suggestions,
            } => Self::TemplateNotFound {
                name: name.clone(),
                directory: directory.clone(),
                suggestions: suggestions.clone(),
            },
            Self::RenderFailure {
                template,
                reason,
            } => Self::RenderFailure {
                template: template.clone(),
                reason: reason.clone(),
            },
            Self::OutputWriteFailure {
                path,
                reason,
            } => Self::OutputWriteFailure {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::ManifestNotFound => Self::ManifestNotFound,
            Self::ManifestParseError {
                file,
                reason,
            } => Self::ManifestParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ManifestValidationError {
                reason,
            } => Self::ManifestValidationError {
                reason: reason.clone(),
            },
            Self::DependencyResolutionFailed {
                reason,
            } => Self::DependencyResolutionFailed {
                reason: reason.clone(),
            },
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

impl TplgenError {
    /// The controller type this error refers to, if it is a controller-stage error.
    #[must_use]
    pub fn controller_type(&self) -> Option<&str> {
        match self {
            Self::TypeNotFound {
                type_name,
                ..
            }
            | Self::LoadError {
                type_name,
                ..
            }
            | Self::MethodNotFound {
                type_name,
                ..
            }
            | Self::ContractViolation {
                type_name,
                ..
            }
            | Self::InstantiationFailure {
                type_name,
                ..
            }
            | Self::InvocationFailure {
                type_name,
                ..
            }
            | Self::NullResult {
                type_name,
                ..
            }
            | Self::NonStringKey {
                type_name,
                ..
            }
            | Self::CompileFailure {
                type_name,
                ..
            } => Some(type_name),
            _ => None,
        }
    }

    /// The configured controller method this error refers to.
    #[must_use]
    pub fn controller_method(&self) -> Option<&str> {
        match self {
            Self::TypeNotFound {
                method,
                ..
            }
            | Self::LoadError {
                method,
                ..
            }
            | Self::MethodNotFound {
                method,
                ..
            }
            | Self::ContractViolation {
                method,
                ..
            }
            | Self::InstantiationFailure {
                method,
                ..
            }
            | Self::InvocationFailure {
                method,
                ..
            }
            | Self::NullResult {
                method,
                ..
            }
            | Self::NonStringKey {
                method,
                ..
            }
            | Self::CompileFailure {
                method,
                ..
            } => Some(method),
            _ => None,
        }
    }
}

/// Error context wrapper that pairs a [`TplgenError`] with display hints.
///
/// # Examples
///
/// ```rust,no_run
/// use tplgen_cli::core::{ErrorContext, TplgenError};
///
/// let context = ErrorContext::new(TplgenError::ManifestNotFound)
///     .with_suggestion("Create a tplgen.toml file in your project directory")
///     .with_details("tplgen searches for tplgen.toml in current and parent directories");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TplgenError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TplgenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with suggestions.
///
/// Recognizes [`TplgenError`] anywhere behind `anyhow` context layers, plain
/// [`std::io::Error`]s and [`toml::de::Error`]s. Anything else keeps its full
/// cause chain in the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(tplgen_error) = error.downcast_ref::<TplgenError>() {
        let ctx = create_error_context(tplgen_error.clone());
        // Context layers added on the way out (unit name, manifest path) are
        // only visible in the outer message.
        let outer = error.to_string();
        let inner = tplgen_error.to_string();
        if outer != inner && ctx.details.is_none() {
            return ctx.with_details(outer);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(TplgenError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check file ownership and permissions of the template and output directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(TplgenError::Other {
                    message: format_chain(&error),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(TplgenError::ManifestParseError {
            file: crate::constants::MANIFEST_FILE_NAME.to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax in your tplgen.toml file. Verify quotes, brackets, and table names")
        .with_details(toml_error.to_string());
    }

    ErrorContext::new(TplgenError::Other {
        message: format_chain(&error),
    })
}

fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

fn create_error_context(error: TplgenError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<String>) = match &error {
        TplgenError::TypeNotFound {
            type_name,
            after_compile: false,
            ..
        } => (
            Some(format!(
                "Set `compile = true` on the controller, or make sure {type_name} is provided by the output directory or a direct dependency"
            )),
            Some(
                "Controllers are only looked up in the output directory and the project's direct runtime dependencies"
                    .to_string(),
            ),
        ),
        TplgenError::TypeNotFound {
            type_name,
            after_compile: true,
            ..
        } => (
            Some(format!(
                "Check that {} exists under the source directory and exports the controller entry symbol",
                crate::controller::compile::source_unit_path(type_name).display()
            )),
            Some("The compiler ran successfully but produced no loadable controller".to_string()),
        ),
        TplgenError::MethodNotFound {
            suggestions,
            ..
        } if !suggestions.is_empty() => {
            (Some(format!("Did you mean: {}?", suggestions.join(", "))), None)
        }
        TplgenError::MethodNotFound {
            ..
        } => (
            Some("Controller methods must take no arguments and return a key/value map".to_string()),
            None,
        ),
        TplgenError::ContractViolation {
            ..
        } => (Some("Declare the controller method with a map return type".to_string()), None),
        TplgenError::NonStringKey {
            ..
        } => (
            Some(
                "Template attributes are named by strings; convert keys before returning them"
                    .to_string(),
            ),
            Some("No attributes from this controller were installed".to_string()),
        ),
        TplgenError::NullResult {
            ..
        } => (
            Some(
                "Return an empty map instead of no value when there is nothing to render"
                    .to_string(),
            ),
            None,
        ),
        TplgenError::CompileFailure {
            reason,
            ..
        } => (None, Some(reason.clone())),
        TplgenError::TemplateNotFound {
            suggestions,
            ..
        } if !suggestions.is_empty() => {
            (Some(format!("Did you mean: {}?", suggestions.join(", "))), None)
        }
        TplgenError::TemplateNotFound {
            ..
        } => (
            Some(
                "Templates are looked up as <directory>/<name>.tera or <directory>/<name>.st"
                    .to_string(),
            ),
            None,
        ),
        TplgenError::RenderFailure {
            ..
        } => (
            Some(
                "Check template syntax and make sure every referenced attribute is provided by the controller or the unit's properties"
                    .to_string(),
            ),
            None,
        ),
        TplgenError::ManifestNotFound => (
            Some(
                "Create a tplgen.toml file in your project directory or pass --manifest-path"
                    .to_string(),
            ),
            Some(
                "tplgen looks for tplgen.toml in the current directory and parent directories up to the filesystem root"
                    .to_string(),
            ),
        ),
        TplgenError::ManifestParseError {
            file,
            reason,
        } => (
            Some(format!(
                "Check the TOML syntax in {file}. Common issues: missing quotes, unmatched brackets, misspelled keys"
            )),
            Some(reason.clone()),
        ),
        _ => (None, None),
    };

    ErrorContext {
        error,
        suggestion,
        details,
    }
}

//! Global constants used throughout the tplgen codebase.
//!
//! File names, naming conventions, and ABI identifiers that several modules
//! need to agree on live here so they cannot drift apart.

/// Name of the project manifest searched for from the working directory upward.
pub const MANIFEST_FILE_NAME: &str = "tplgen.toml";

/// Conventional name of the optional property-setter method on a controller.
///
/// A controller that exposes a single-argument method with this name receives
/// its static `properties` table before the contracted method is invoked.
pub const PROPERTY_SETTER_NAME: &str = "set_properties";

/// Extension appended to a controller's source unit path for compilation.
pub const CONTROLLER_SOURCE_EXTENSION: &str = "rs";

/// Exported symbol every controller dynamic library must provide.
pub const CONTROLLER_ENTRY_SYMBOL: &str = "tplgen_controller_module_v1";

/// ABI version of the controller module table understood by this host.
pub const CONTROLLER_ABI_VERSION: u32 = 1;

/// Directory name that marks generated sources eligible for registration as
/// a compile source root.
pub const GENERATED_SOURCES_DIR: &str = "generated-sources";

/// Extension of output files registered as compile source roots.
pub const GENERATED_SOURCE_EXTENSION: &str = "rs";

/// Default edition handed to the compiler for controller sources.
pub const DEFAULT_SOURCE_VERSION: &str = "2021";

/// Default directory (relative to the project) holding compiled controllers.
pub const DEFAULT_OUTPUT_DIR: &str = "target/controllers";

/// Default directory (relative to the project) holding controller sources.
pub const DEFAULT_SOURCE_DIR: &str = "controllers";

/// Template file extensions, in lookup order.
///
/// `.tera` templates use Tera's native `{{ name }}` syntax; `.st` templates use
/// angle-bracket attribute references (`<name>`).
pub const TEMPLATE_EXTENSIONS: &[&str] = &["tera", "st"];

/// Maximum number of "did you mean" suggestions attached to an error.
pub const MAX_SUGGESTIONS: usize = 3;

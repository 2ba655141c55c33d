//! Template lookup and rendering for generation units.
//!
//! Each generation unit names a template directory and a logical template
//! name. [`TemplateSource::load`] finds the file, [`TemplateRenderer::prepare`]
//! parses it, and [`TemplateRenderer::render`] fills it from a Tera context
//! holding the controller's attributes followed by the unit's static
//! properties.
//!
//! # Supported Syntax
//!
//! - `.tera`: full Tera syntax (`{{ name }}`, `{% for item in items %}...{% endfor %}`)
//! - `.st`: angle-bracket attribute references (`Hello, <name>!`)
//!
//! Rendering is strict for `.tera` templates: a variable missing from the
//! context fails the unit, with close-name suggestions in the error.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tera::Context;
//! use tplgen_cli::templating::{TemplateRenderer, TemplateSource};
//!
//! # fn example() -> anyhow::Result<()> {
//! let source = TemplateSource::load(Path::new("templates"), "Greeting")?;
//! let renderer = TemplateRenderer::new();
//! let template = renderer.prepare(&source)?;
//!
//! let mut context = Context::new();
//! context.insert("name", "World");
//! let output = renderer.render(&template, &context)?;
//! # Ok(())
//! # }
//! ```

pub mod renderer;

pub use renderer::{PreparedTemplate, TemplateRenderer, TemplateSource, TemplateSyntax, angle_to_tera};

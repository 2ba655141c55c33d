//! Template loading and rendering with Tera.
//!
//! Templates are looked up by logical name inside their directory, trying
//! each of [`TEMPLATE_EXTENSIONS`] in order. `.tera` files are handed to Tera
//! as they are. `.st` files use angle-bracket attribute references and are
//! rewritten to Tera syntax first:
//!
//! | `.st` source       | Tera equivalent                       |
//! |--------------------|---------------------------------------|
//! | `<name>`           | `{{ name \| default(value="") }}`     |
//! | `<user.name>`      | `{{ user.name \| default(value="") }}`|
//! | `\<`               | a literal `<`                         |
//!
//! Missing attributes render as empty text in `.st` templates and fail the
//! render in `.tera` templates. Anything else in an `.st` file, including
//! `{{`, is copied through literally.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tera::{Context as TeraContext, Tera};
use walkdir::WalkDir;

use crate::constants::TEMPLATE_EXTENSIONS;
use crate::core::TplgenError;
use crate::utils::suggest::similar_names;

static ATTRIBUTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\\<|<([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)>").ok()
});

static MISSING_VARIABLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Variable `([^`]+)` not found").ok());

/// Syntax a template file is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSyntax {
    /// Tera's native `{{ ... }}` syntax.
    Tera,
    /// Angle-bracket attribute references.
    Angle,
}

impl TemplateSyntax {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "tera" => Some(Self::Tera),
            "st" => Some(Self::Angle),
            _ => None,
        }
    }
}

/// A template read from disk.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Logical template name.
    pub name: String,
    /// File the template was read from.
    pub path: PathBuf,
    pub syntax: TemplateSyntax,
    /// Raw file content.
    pub content: String,
}

impl TemplateSource {
    /// Find and read the template `name` in `directory`.
    ///
    /// # Errors
    ///
    /// [`TplgenError::TemplateNotFound`] with similarly named templates when
    /// no candidate file exists; [`TplgenError::IoError`] when one exists but
    /// cannot be read.
    pub fn load(directory: &Path, name: &str) -> Result<Self, TplgenError> {
        for (path, syntax) in candidates(directory, name) {
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                tracing::debug!("Loaded template {} from {}", name, path.display());
                return Ok(Self {
                    name: name.to_string(),
                    path,
                    syntax,
                    content,
                });
            }
        }

        let available = available_templates(directory);
        Err(TplgenError::TemplateNotFound {
            name: name.to_string(),
            directory: directory.display().to_string(),
            suggestions: similar_names(name, available.iter().map(String::as_str)),
        })
    }

    /// Template text in Tera syntax.
    #[must_use]
    pub fn tera_source(&self) -> String {
        match self.syntax {
            TemplateSyntax::Tera => self.content.clone(),
            TemplateSyntax::Angle => angle_to_tera(&self.content),
        }
    }
}

fn candidates(directory: &Path, name: &str) -> Vec<(PathBuf, TemplateSyntax)> {
    let mut found = Vec::new();
    let explicit = Path::new(name).extension().and_then(|e| e.to_str()).and_then(TemplateSyntax::from_extension);
    if let Some(syntax) = explicit {
        found.push((directory.join(name), syntax));
    }
    for extension in TEMPLATE_EXTENSIONS {
        if let Some(syntax) = TemplateSyntax::from_extension(extension) {
            found.push((directory.join(format!("{name}.{extension}")), syntax));
        }
    }
    found
}

/// Logical names of every template below `directory`.
fn available_templates(directory: &Path) -> Vec<String> {
    WalkDir::new(directory)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let path = entry.path();
            let extension = path.extension()?.to_str()?;
            if !TEMPLATE_EXTENSIONS.contains(&extension) {
                return None;
            }
            let relative = path.strip_prefix(directory).ok()?.with_extension("");
            Some(relative.to_string_lossy().replace('\\', "/"))
        })
        .collect()
}

/// Rewrite angle-bracket attribute references to Tera expressions.
#[must_use]
pub fn angle_to_tera(source: &str) -> String {
    let Some(re) = ATTRIBUTE.as_ref() else {
        return escape_tera(source);
    };

    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut last = 0;
    for caps in re.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&escape_tera(&source[last..whole.start()]));
        match caps.get(1) {
            Some(attribute) => {
                out.push_str("{{ ");
                out.push_str(attribute.as_str());
                out.push_str(" | default(value=\"\") }}");
            }
            None => out.push('<'),
        }
        last = whole.end();
    }
    out.push_str(&escape_tera(&source[last..]));
    out
}

/// Make literal text safe to embed in a Tera template.
fn escape_tera(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{'
            && let Some(&next) = chars.peek()
            && matches!(next, '{' | '%' | '#')
        {
            chars.next();
            out.push_str(&format!("{{{{ \"{{{next}\" }}}}"));
            continue;
        }
        // A trailing brace would merge with a following `{{`.
        if c == '{' && chars.peek().is_none() {
            out.push_str("{{ \"{\" }}");
            continue;
        }
        out.push(c);
    }
    out
}

/// Tera template compiled from a [`TemplateSource`].
///
/// Parsing happens in [`TemplateRenderer::prepare`], so syntax errors are
/// reported before any controller runs.
pub struct PreparedTemplate {
    name: String,
    tera: Tera,
}

impl std::fmt::Debug for PreparedTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTemplate").field("name", &self.name).finish()
    }
}

impl PreparedTemplate {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Renders generation templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse `source` into a renderable template.
    ///
    /// # Errors
    ///
    /// [`TplgenError::RenderFailure`] when the template does not parse.
    pub fn prepare(&self, source: &TemplateSource) -> Result<PreparedTemplate, TplgenError> {
        let mut tera = Tera::default();
        // Generated sources are never HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_template(&source.name, &source.tera_source()).map_err(|e| {
            TplgenError::RenderFailure {
                template: source.name.clone(),
                reason: format_tera_error(&e),
            }
        })?;
        Ok(PreparedTemplate {
            name: source.name.clone(),
            tera,
        })
    }

    /// Render a prepared template with `context`.
    ///
    /// # Errors
    ///
    /// [`TplgenError::RenderFailure`] with the full Tera error chain, plus
    /// close-name hints when a variable is missing.
    pub fn render(&self, template: &PreparedTemplate, context: &TeraContext) -> Result<String, TplgenError> {
        template.tera.render(&template.name, context).map_err(|e| {
            let mut reason = format_tera_error(&e);
            if let Some(missing) = extract_variable_name(&reason) {
                let available = context_keys(context);
                let suggestions = similar_names(&missing, available.iter().map(String::as_str));
                if !suggestions.is_empty() {
                    reason.push_str(&format!(" (did you mean: {}?)", suggestions.join(", ")));
                }
            }
            TplgenError::RenderFailure {
                template: template.name.clone(),
                reason,
            }
        })
    }
}

/// Flatten a Tera error and its sources into one line.
fn format_tera_error(error: &tera::Error) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

fn extract_variable_name(message: &str) -> Option<String> {
    let re = MISSING_VARIABLE.as_ref()?;
    re.captures(message).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

fn context_keys(context: &TeraContext) -> Vec<String> {
    match context.clone().into_json() {
        serde_json::Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(name: &str, syntax: TemplateSyntax, content: &str) -> TemplateSource {
        TemplateSource {
            name: name.to_string(),
            path: PathBuf::from(name),
            syntax,
            content: content.to_string(),
        }
    }

    fn render(source: &TemplateSource, context: &TeraContext) -> Result<String, TplgenError> {
        let renderer = TemplateRenderer::new();
        let prepared = renderer.prepare(source)?;
        renderer.render(&prepared, context)
    }

    #[test]
    fn test_angle_syntax_renders_attributes() {
        let mut context = TeraContext::new();
        context.insert("name", "World");

        let template = source("Greeting", TemplateSyntax::Angle, "Hello, <name>!");
        assert_eq!(render(&template, &context).unwrap(), "Hello, World!");
    }

    #[test]
    fn test_angle_syntax_escapes_and_literals() {
        let mut context = TeraContext::new();
        context.insert("user", &serde_json::json!({"name": "Ada"}));

        let template = source(
            "Escapes",
            TemplateSyntax::Angle,
            "fn f() -> \\<T> { <user.name> } {{ raw }} {% raw %} a < b",
        );
        assert_eq!(
            render(&template, &context).unwrap(),
            "fn f() -> <T> { Ada } {{ raw }} {% raw %} a < b"
        );
    }

    #[test]
    fn test_angle_syntax_missing_attribute_is_empty() {
        let template = source("Missing", TemplateSyntax::Angle, "[<absent>]");
        assert_eq!(render(&template, &TeraContext::new()).unwrap(), "[]");
    }

    #[test]
    fn test_indentation_is_preserved() {
        let mut context = TeraContext::new();
        context.insert("body", "return 1;");
        let template = source("Indent", TemplateSyntax::Angle, "fn one() {\n    <body>\n}\n");
        assert_eq!(render(&template, &context).unwrap(), "fn one() {\n    return 1;\n}\n");
    }

    #[test]
    fn test_tera_missing_variable_suggests_close_names() {
        let mut context = TeraContext::new();
        context.insert("name", "World");

        let template = source("Strict", TemplateSyntax::Tera, "Hello, {{ nme }}!");
        let err = render(&template, &context).unwrap_err();
        match err {
            TplgenError::RenderFailure {
                template,
                reason,
            } => {
                assert_eq!(template, "Strict");
                assert!(reason.contains("did you mean: name?"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_detected_at_prepare() {
        let template = source("Broken", TemplateSyntax::Tera, "{% if %}");
        let err = TemplateRenderer::new().prepare(&template).unwrap_err();
        assert!(matches!(err, TplgenError::RenderFailure { .. }));
    }

    #[test]
    fn test_load_prefers_tera_then_st() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Greeting.st"), "Hello, <name>!").unwrap();

        let loaded = TemplateSource::load(temp.path(), "Greeting").unwrap();
        assert_eq!(loaded.syntax, TemplateSyntax::Angle);

        std::fs::write(temp.path().join("Greeting.tera"), "Hello, {{ name }}!").unwrap();
        let loaded = TemplateSource::load(temp.path(), "Greeting").unwrap();
        assert_eq!(loaded.syntax, TemplateSyntax::Tera);
    }

    #[test]
    fn test_load_missing_template_suggests_names() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Greeting.st"), "").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "").unwrap();

        let err = TemplateSource::load(temp.path(), "Greting").unwrap_err();
        match err {
            TplgenError::TemplateNotFound {
                name,
                suggestions,
                ..
            } => {
                assert_eq!(name, "Greting");
                assert_eq!(suggestions, vec!["Greeting".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

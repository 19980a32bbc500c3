//! Theme engine
//!
//! This module provides template rendering using Tera.
//! Features:
//! - Templates embedded in the binary
//! - Per-file overrides from a theme directory on disk
//! - Standard template variables
//! - Fallback to an error template, then a built-in page

use anyhow::{Context, Result};
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context as TeraContext, Tera};

use crate::models::User;

mod error;

pub use error::ThemeError;

/// Templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Template renderer shared by all handlers.
///
/// Immutable once built; share it behind an `Arc`.
pub struct ThemeEngine {
    tera: Tera,
    /// Directory whose templates override the embedded ones
    theme_path: Option<PathBuf>,
    /// Names of templates that came from `theme_path`
    overridden: Vec<String>,
}

impl ThemeEngine {
    /// Build the engine from the embedded templates, letting any same-named
    /// `.html` file under `theme_path` replace its embedded counterpart.
    ///
    /// A missing theme directory is not an error.
    pub fn new(theme_path: &Path) -> Result<Self> {
        let mut templates = embedded_templates()?;

        let mut overridden = Vec::new();
        if theme_path.is_dir() {
            let mut on_disk = Vec::new();
            collect_templates_from_dir(theme_path, theme_path, &mut on_disk)?;
            for (name, content) in on_disk {
                overridden.push(name.clone());
                templates.insert(name, content);
            }
            overridden.sort();
            tracing::info!(
                "Loaded {} template override(s) from {:?}",
                overridden.len(),
                theme_path
            );
        } else {
            tracing::debug!("Theme directory {:?} not found, using embedded templates", theme_path);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(error_chain(&e)))?;

        Ok(Self {
            tera,
            theme_path: theme_path.is_dir().then(|| theme_path.to_path_buf()),
            overridden,
        })
    }

    /// Engine with only the embedded templates
    #[cfg(test)]
    pub fn embedded() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(embedded_templates()?)
            .map_err(|e| ThemeError::TemplateError(error_chain(&e)))?;
        Ok(Self {
            tera,
            theme_path: None,
            overridden: Vec::new(),
        })
    }

    /// Render a template with the given context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, error_chain(&e)))
                .into()
        })
    }

    /// Render a template with standard variables automatically added
    pub fn render_with_standard_vars(
        &self,
        template: &str,
        context: &TeraContext,
        standard_vars: &StandardTemplateVars,
    ) -> Result<String> {
        self.render(template, &standard_vars.extend(context))
    }

    /// Render a template, falling back to `error.html` and then to a
    /// built-in page. Never fails.
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("{:#}, trying error template", e);

                let mut error_context = context.clone();
                error_context.insert("requested_template", template);

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::error!(
                            "Failed to render error template: {:#}, returning built-in error page",
                            error_template_err
                        );
                        Self::simple_error_page()
                    }
                }
            }
        }
    }

    /// Last-resort page when even `error.html` cannot be rendered
    fn simple_error_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Error</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 600px;
            margin: 50px auto;
            padding: 20px;
        }
        .error-box {
            border-left: 4px solid #e74c3c;
            padding: 20px;
        }
        h1 { color: #e74c3c; margin-top: 0; }
    </style>
</head>
<body>
    <div class="error-box">
        <h1>Something went wrong</h1>
        <p>This page could not be displayed. Please try again later.</p>
    </div>
</body>
</html>"#
            .to_string()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Templates replaced from the theme directory, sorted
    pub fn overridden_templates(&self) -> &[String] {
        &self.overridden
    }

    pub fn theme_path(&self) -> Option<&Path> {
        self.theme_path.as_deref()
    }
}

/// Embedded templates keyed by name ("admin/login.html")
fn embedded_templates() -> Result<BTreeMap<String, String>> {
    let mut templates = BTreeMap::new();
    for name in EmbeddedTemplates::iter() {
        let file = EmbeddedTemplates::get(&name)
            .ok_or_else(|| ThemeError::TemplateError(format!("Embedded template vanished: {}", name)))?;
        let content = String::from_utf8(file.data.into_owned())
            .map_err(|_| ThemeError::TemplateError(format!("Template is not UTF-8: {}", name)))?;
        templates.insert(name.into_owned(), content);
    }
    Ok(templates)
}

/// Collect `.html` files below `current_path`, named relative to `base_path`
fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<()> {
    for entry in fs::read_dir(current_path)
        .with_context(|| format!("Failed to read theme directory: {:?}", current_path))?
    {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().map_or(false, |ext| ext == "html") {
            let relative_path = path
                .strip_prefix(base_path)
                .map_err(|_| ThemeError::TemplateError("Failed to get relative path".to_string()))?;

            // Forward slashes on every platform
            let template_name = relative_path.to_string_lossy().replace('\\', "/");

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template: {:?}", path))?;

            templates.push((template_name, content));
        }
    }

    Ok(())
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Variables every page template can rely on
#[derive(Debug, Clone, Serialize)]
pub struct StandardTemplateVars {
    pub site_name: String,
    pub site_description: String,
    /// Logged-in admin, if any
    pub current_user: Option<CurrentUser>,
    /// Current request path
    pub request_path: String,
    /// Current year (for copyright)
    pub year: i32,
    /// One-shot message carried over from the previous request
    pub flash: Option<FlashMessage>,
}

/// Current user information for templates
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Kind of a flash message, used as a CSS class suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

impl StandardTemplateVars {
    pub fn new(
        site_name: impl Into<String>,
        site_description: impl Into<String>,
        request_path: impl Into<String>,
    ) -> Self {
        Self {
            site_name: site_name.into(),
            site_description: site_description.into(),
            current_user: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
            flash: None,
        }
    }

    pub fn with_user(mut self, user: Option<CurrentUser>) -> Self {
        self.current_user = user;
        self
    }

    pub fn with_flash(mut self, flash: Option<FlashMessage>) -> Self {
        self.flash = flash;
        self
    }

    /// `context` plus these variables. Optional values are only inserted
    /// when present so templates can test them with `{% if %}`.
    pub fn extend(&self, context: &TeraContext) -> TeraContext {
        let mut full_context = context.clone();
        full_context.insert("site_name", &self.site_name);
        full_context.insert("site_description", &self.site_description);
        full_context.insert("request_path", &self.request_path);
        full_context.insert("year", &self.year);

        if let Some(ref user) = self.current_user {
            full_context.insert("current_user", user);
        }
        if let Some(ref flash) = self.flash {
            full_context.insert("flash", flash);
        }
        full_context
    }
}

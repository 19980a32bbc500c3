//! Post body rendering
//!
//! [`ContentRenderer`] turns a stored post body into displayable markup
//! according to its declared [`ContentFormat`]. Markdown goes through
//! [`MarkdownRenderer`] (pulldown-cmark, with syntect highlighting for fenced
//! code and `id` anchors on every heading). Every other format is returned
//! untouched; escaping is left to the template.
//!
//! ```
//! use aptinnova::models::ContentFormat;
//! use aptinnova::services::markdown::ContentRenderer;
//!
//! let renderer = ContentRenderer::new();
//! let html = renderer.render(&ContentFormat::Markdown, "# Hi");
//! assert!(html.contains("<h1 id=\"hi\">"));
//! assert_eq!(renderer.render(&ContentFormat::parse("raw"), "# Hi"), "# Hi");
//! ```

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;
use std::sync::Arc;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::models::ContentFormat;
use crate::services::slug::generate_slug;

const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Format-aware renderer for post bodies
#[derive(Clone, Default)]
pub struct ContentRenderer {
    markdown: MarkdownRenderer,
}

impl ContentRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `content` declared as `format`.
    ///
    /// Markdown becomes HTML; anything else is returned unchanged and
    /// unsanitized.
    pub fn render(&self, format: &ContentFormat, content: &str) -> String {
        match format {
            ContentFormat::Markdown => self.markdown.render(content),
            _ => content.to_string(),
        }
    }
}

/// Markdown to HTML with syntax highlighting and heading anchors.
///
/// Supports fenced code blocks, tables, strikethrough and task lists.
#[derive(Clone)]
pub struct MarkdownRenderer {
    syntax_set: Arc<SyntaxSet>,
    theme_set: Arc<ThemeSet>,
    theme_name: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    /// Renderer using the "base16-ocean.dark" highlighting theme
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Renderer with a named syntect theme, falling back to the default one
    fn with_theme(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        let theme_name = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            DEFAULT_THEME.to_string()
        };

        Self {
            syntax_set: Arc::new(SyntaxSet::load_defaults_newlines()),
            theme_set: Arc::new(theme_set),
            theme_name,
        }
    }

    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options);
        let events = self.process_events(parser);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Replace code blocks with highlighted HTML and give headings ids.
    fn process_events<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();

        let mut code_lang: Option<String> = None;
        let mut code_content: Option<String> = None;

        // Heading events are held back until the text (and so the id) is known.
        let mut heading: Option<(Tag<'a>, Vec<Event<'a>>, String)> = None;
        let mut anchors = HeadingAnchors::default();

        for event in parser {
            if let Some(code) = code_content.as_mut() {
                match event {
                    Event::Text(text) => code.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = match code_lang.take() {
                            Some(lang) => self.highlight_code(code, &lang),
                            None => plain_code_block(code, None),
                        };
                        events.push(Event::Html(html.into()));
                        code_content = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                            lang.split_whitespace().next().map(str::to_string)
                        }
                        _ => None,
                    };
                    code_content = Some(String::new());
                }
                Event::Start(tag @ Tag::Heading { .. }) => {
                    heading = Some((tag, Vec::new(), String::new()));
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some((tag, inner, text)) = heading.take() {
                        let tag = match tag {
                            Tag::Heading {
                                id: None,
                                classes,
                                attrs,
                                ..
                            } => Tag::Heading {
                                level,
                                id: Some(CowStr::from(anchors.next(&text))),
                                classes,
                                attrs,
                            },
                            other => other,
                        };
                        events.push(Event::Start(tag));
                        events.extend(inner);
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                other => match heading.as_mut() {
                    Some((_, inner, text)) => {
                        if let Event::Text(t) | Event::Code(t) = &other {
                            text.push_str(t);
                        }
                        inner.push(other);
                    }
                    None => events.push(other),
                },
            }
        }

        events
    }

    /// Highlight with syntect, or fall back to a plain block tagged with the
    /// language when syntect doesn't know it.
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        let theme = self.theme_set.themes.get(&self.theme_name);

        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|_| plain_code_block(code, Some(lang)))
            }
            _ => plain_code_block(code, Some(lang)),
        }
    }
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>", html_escape(code)),
    }
}

/// Hands out heading ids, numbering repeats: `intro`, `intro-2`, `intro-3`.
#[derive(Default)]
struct HeadingAnchors {
    seen: HashMap<String, u32>,
}

impl HeadingAnchors {
    fn next(&mut self, text: &str) -> String {
        let mut base = generate_slug(text);
        if base.is_empty() {
            base = "section".to_string();
        }
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{}-{}", base, count)
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

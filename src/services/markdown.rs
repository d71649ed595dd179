//! Markdown rendering for blog posts
//!
//! Posts are rendered once, on save, and the HTML is stored next to the
//! source. Raw HTML in the source is escaped rather than passed through.
//!
//! ```
//! use hay_property::services::markdown::MarkdownRenderer;
//!
//! let html = MarkdownRenderer::new().render("# Buying land\n\nRead the **survey**.");
//! assert!(html.contains("<h1>"));
//! assert!(html.contains("<strong>survey</strong>"));
//! ```

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

/// Longest generated excerpt, in characters
pub const EXCERPT_LENGTH: usize = 200;

/// Markdown to HTML renderer
#[derive(Debug, Clone, Copy)]
pub struct MarkdownRenderer {
    options: Options,
}

// `Options` does not implement `Default`; mirror what the derive would produce
impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { options: Options::empty() }
    }
}

impl MarkdownRenderer {
    /// Renderer with tables, strikethrough, task lists and smart punctuation
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_SMART_PUNCTUATION);
        Self { options }
    }

    /// Render Markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options).map(|event| match event {
            // Treat embedded HTML as text so it gets escaped
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }

    /// Plain-text summary of the first paragraphs, cut at a word boundary
    pub fn excerpt(&self, markdown: &str) -> String {
        let mut text = String::new();
        let mut in_code_block = false;

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::End(TagEnd::CodeBlock) => in_code_block = false,
                Event::Text(t) | Event::Code(t) if !in_code_block => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Heading(_)) => text.push(' '),
                _ => {}
            }
            if text.chars().count() > EXCERPT_LENGTH {
                break;
            }
        }

        truncate_words(text.split_whitespace().collect::<Vec<_>>().join(" ").as_str(), EXCERPT_LENGTH)
    }
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}…", trimmed.trim_end_matches(|c: char| c.is_ascii_punctuation()))
}

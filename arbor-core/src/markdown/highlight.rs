//! Code syntax highlighting using syntect.

use super::events::event_into_static;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

/// Transformer for syntax highlighting fenced code blocks
pub struct HighlightTransformer {
    theme: Theme,
}

impl HighlightTransformer {
    /// Build a transformer for a named syntect theme, falling back to
    /// `InspiredGitHub` when the name is unknown.
    pub fn new(theme_name: &str) -> Self {
        let themes = &theme_set().themes;
        let theme = themes
            .get(theme_name)
            .or_else(|| themes.get("InspiredGitHub"))
            .or_else(|| themes.values().next())
            .cloned()
            .unwrap_or_default();

        Self { theme }
    }

    /// Transform events, replacing fenced code blocks with highlighted HTML
    pub fn transform(&self, events: Vec<Event<'_>>) -> Vec<Event<'static>> {
        let mut result = Vec::new();
        let mut in_code_block = false;
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                    in_code_block = true;
                    code_lang = Some(lang.to_string());
                    code_content.clear();
                }
                Event::Text(text) if in_code_block => {
                    code_content.push_str(text.as_ref());
                }
                Event::End(TagEnd::CodeBlock) if in_code_block => {
                    in_code_block = false;

                    match code_lang.take() {
                        Some(lang) if !lang.is_empty() => {
                            let highlighted = self.highlight_code(&code_content, &lang);
                            result.push(Event::Html(CowStr::Boxed(highlighted.into_boxed_str())));
                        }
                        _ => {
                            result.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)));
                            result.push(Event::Text(CowStr::Boxed(
                                code_content.clone().into_boxed_str(),
                            )));
                            result.push(Event::End(TagEnd::CodeBlock));
                        }
                    }
                }
                _ => result.push(event_into_static(event)),
            }
        }

        result
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let ss = syntax_set();
        let syntax = ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_extension(lang))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        match highlighted_html_for_string(code, ss, syntax, &self.theme) {
            Ok(html) => html,
            Err(_) => format!("<pre><code>{}</code></pre>", super::html_escape(code)),
        }
    }
}

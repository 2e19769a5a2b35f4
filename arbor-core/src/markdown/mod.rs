//! Markdown engine: rendering with wikilink and highlighting extensions,
//! plus raw link extraction for the graph pass.

mod events;
pub mod highlight;
pub mod wikilinks;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

pub use highlight::HighlightTransformer;
pub use wikilinks::WikilinkTransformer;

/// Raw reference targets collected from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Wikilink targets, relative document paths without extension.
    pub backlinks: Vec<String>,

    /// Embedded image targets, relative to the document's directory.
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
struct TocItem {
    level: u32,
    title: String,
    id: String,
}

/// Markdown processor for document bodies
pub struct MarkdownProcessor {
    options: Options,
    highlighter: Option<HighlightTransformer>,
    keep_extension: bool,
}

impl MarkdownProcessor {
    pub fn new(highlight: bool, theme: &str, keep_extension: bool) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            options,
            highlighter: highlight.then(|| HighlightTransformer::new(theme)),
            keep_extension,
        }
    }

    /// Render a document body to HTML.
    ///
    /// Wikilinks become relative links, headings get stable ids, fenced code
    /// blocks are highlighted when configured, and a table of contents is
    /// prepended when `toc` is set and the body has headings.
    pub fn render(&self, markdown: &str, toc: bool) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let all_events: Vec<Event> = parser.collect();

        let headings = collect_headings(&all_events);

        let wikilink = WikilinkTransformer::new(self.keep_extension);
        let (transformed, _) = wikilink.transform(all_events);

        let transformed = attach_heading_ids(transformed, &headings);

        let transformed = match &self.highlighter {
            Some(h) => h.transform(transformed),
            None => transformed,
        };

        let mut output = String::new();
        if toc && !headings.is_empty() {
            output.push_str(&render_toc(&headings));
        }
        html::push_html(&mut output, transformed.into_iter());

        output
    }

    /// Collect wikilink and image targets without rendering.
    pub fn extract_links(&self, markdown: &str) -> ExtractedLinks {
        let parser = Parser::new_ext(markdown, self.options);
        let events: Vec<Event> = parser.collect();

        let mut images = Vec::new();
        for event in &events {
            if let Event::Start(Tag::Image { dest_url, .. }) = event {
                images.push(dest_url.to_string());
            }
        }

        let wikilink = WikilinkTransformer::new(self.keep_extension);
        let (_, backlinks) = wikilink.transform(events);

        ExtractedLinks { backlinks, images }
    }
}

fn collect_headings(events: &[Event]) -> Vec<TocItem> {
    let mut toc = Vec::new();
    let mut current: Option<(u32, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((*level as u32, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current.take() {
                    let id = anchor_slug(&title);
                    toc.push(TocItem { level, title, id });
                }
            }
            _ => {}
        }
    }

    toc
}

fn attach_heading_ids(
    mut events: Vec<Event<'static>>,
    headings: &[TocItem],
) -> Vec<Event<'static>> {
    let mut heading_iter = headings.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events.drain(..) {
        match event {
            Event::Start(Tag::Heading {
                level,
                mut id,
                classes,
                attrs,
            }) => {
                if id.is_none() {
                    if let Some(next) = heading_iter.next() {
                        id = Some(CowStr::Boxed(next.id.clone().into_boxed_str()));
                    }
                }
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            _ => result.push(event),
        }
    }

    result
}

fn render_toc(headings: &[TocItem]) -> String {
    let mut out = String::from(r#"<nav class="toc"><ul>"#);
    for h in headings {
        out.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
            h.level,
            h.id,
            html_escape(&h.title)
        ));
    }
    out.push_str("</ul></nav>");
    out
}

/// Anchor id for a heading title: lowercase, alphanumerics kept,
/// whitespace collapsed to single hyphens.
fn anchor_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true;

    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }

    slug.trim_matches('-').to_string()
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

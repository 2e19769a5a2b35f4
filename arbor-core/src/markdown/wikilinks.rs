//! Wikilink transformation for [[target]] and [[target|text]] syntax.
//!
//! Targets are relative document paths (`other`, `../notes/other`), not
//! slugs; resolution against the source tree happens in the graph pass.

use super::events::event_into_static;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

/// Transformer for wikilink syntax
pub struct WikilinkTransformer {
    extension: &'static str,
}

impl WikilinkTransformer {
    pub fn new(keep_extension: bool) -> Self {
        Self {
            extension: if keep_extension { ".html" } else { "" },
        }
    }

    /// Transform events, converting [[wikilinks]] to HTML links.
    ///
    /// Returns (transformed_events, raw_targets).
    pub fn transform(&self, events: Vec<Event<'_>>) -> (Vec<Event<'static>>, Vec<String>) {
        let mut result = Vec::new();
        let mut targets = Vec::new();
        let mut i = 0;
        let mut in_code_block = false;

        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    result.push(event_into_static(events[i].clone()));
                    i += 1;
                    continue;
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    result.push(event_into_static(events[i].clone()));
                    i += 1;
                    continue;
                }
                _ => {}
            }

            // Wikilinks inside code blocks stay literal
            if in_code_block {
                result.push(event_into_static(events[i].clone()));
                i += 1;
                continue;
            }

            if let Event::Text(_) = &events[i] {
                // The parser may split a [[target]] across consecutive text
                // events; merge before scanning
                let mut merged = String::new();
                while i < events.len() {
                    if let Event::Text(text) = &events[i] {
                        merged.push_str(text.as_ref());
                        i += 1;
                    } else {
                        break;
                    }
                }

                if merged.contains("[[") && merged.contains("]]") {
                    self.process_text(&merged, &mut result, &mut targets);
                } else {
                    result.push(Event::Text(CowStr::Boxed(merged.into_boxed_str())));
                }
            } else {
                result.push(event_into_static(events[i].clone()));
                i += 1;
            }
        }

        (result, targets)
    }

    fn process_text(
        &self,
        text: &str,
        events: &mut Vec<Event<'static>>,
        targets: &mut Vec<String>,
    ) {
        let mut remaining = text;

        while let Some(start) = remaining.find("[[") {
            if start > 0 {
                events.push(Event::Text(CowStr::Boxed(
                    remaining[..start].to_string().into_boxed_str(),
                )));
            }

            if let Some(end) = remaining[start..].find("]]") {
                let wikilink = &remaining[start + 2..start + end];
                if let Some(target) = self.emit_link(wikilink, events) {
                    targets.push(target);
                }
                remaining = &remaining[start + end + 2..];
            } else {
                // No closing ]], keep the rest literal
                events.push(Event::Text(CowStr::Boxed(
                    remaining.to_string().into_boxed_str(),
                )));
                return;
            }
        }

        if !remaining.is_empty() {
            events.push(Event::Text(CowStr::Boxed(
                remaining.to_string().into_boxed_str(),
            )));
        }
    }

    fn emit_link(&self, wikilink: &str, events: &mut Vec<Event<'static>>) -> Option<String> {
        // Parse [[target|display text]] or [[target]]
        let (target, display) = if let Some(pipe) = wikilink.find('|') {
            (wikilink[..pipe].trim(), wikilink[pipe + 1..].trim())
        } else {
            (wikilink.trim(), wikilink.trim())
        };

        if target.is_empty() {
            events.push(Event::Text(CowStr::Boxed(
                format!("[[{wikilink}]]").into_boxed_str(),
            )));
            return None;
        }

        let href = format!("{}{}", target, self.extension);

        events.push(Event::Start(Tag::Link {
            link_type: pulldown_cmark::LinkType::Inline,
            dest_url: CowStr::Boxed(href.into_boxed_str()),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(CowStr::Boxed(
            display.to_string().into_boxed_str(),
        )));
        events.push(Event::End(TagEnd::Link));

        Some(target.to_string())
    }
}

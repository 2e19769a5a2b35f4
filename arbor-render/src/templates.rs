//! Askama template definitions.

use arbor_core::{FooterLink, ListingLink, Tag};
use askama::Template;

/// One navigation crumb above the current page
#[derive(Debug, Clone)]
pub struct CrumbEntry {
    pub href: String,
    pub title: String,
}

/// Page template for every document: body, listing, backlinks, related
/// links, and (on the root index) the tag listing.
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    // Site metadata
    pub wiki_title: String,
    pub url: String,
    pub head: String,
    pub root_crumb: String,
    pub footer: Vec<FooterLink>,

    // Page metadata
    pub title: String,
    pub description: String,
    pub filename: String,
    pub date: String,
    pub date_updated: String,
    pub machine_date: String,
    pub machine_date_updated: String,
    pub tags: Vec<String>,
    pub show_header: bool,

    // Content
    pub body: String,
    pub layout_log: bool,

    // Navigation and link lists
    pub crumbs: Vec<CrumbEntry>,
    pub listing: Vec<ListingLink>,
    pub backlinks: Vec<ListingLink>,
    pub related_links: Vec<ListingLink>,

    // Populated on the root index only
    pub tags_listing: Vec<Tag>,
}

/// Tag index page template
#[derive(Template)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub wiki_title: String,
    pub root_crumb: String,
    pub footer: Vec<FooterLink>,
    pub tags: Vec<Tag>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> PageTemplate {
        PageTemplate {
            wiki_title: "Wiki".into(),
            url: "https://example.com/a.html".into(),
            head: String::new(),
            root_crumb: "~".into(),
            footer: vec![],
            title: "A Page".into(),
            description: "About things".into(),
            filename: "a".into(),
            date: "02 Jan 2006".into(),
            date_updated: String::new(),
            machine_date: "2006-01-02T00:00:00+00:00".into(),
            machine_date_updated: String::new(),
            tags: vec!["x".into()],
            show_header: true,
            body: "<p>hello</p>".into(),
            layout_log: false,
            crumbs: vec![CrumbEntry {
                href: "sub/index.html".into(),
                title: "sub".into(),
            }],
            listing: vec![],
            backlinks: vec![],
            related_links: vec![],
            tags_listing: vec![],
        }
    }

    #[test]
    fn test_page_renders() {
        let html = page().render().unwrap();
        assert!(html.contains("<p>hello</p>"));
        assert!(html.contains("A Page"));
        assert!(html.contains("02 Jan 2006"));
        assert!(html.contains("sub/index.html"));
    }

    #[test]
    fn test_header_suppressed() {
        let mut p = page();
        p.show_header = false;
        let html = p.render().unwrap();
        assert!(!html.contains("<header>"));
    }

    #[test]
    fn test_listing_and_links_render() {
        let mut p = page();
        p.listing = vec![ListingLink {
            href: "sub/index.html".into(),
            title: "Sub".into(),
            is_dir: true,
            ..Default::default()
        }];
        p.backlinks = vec![ListingLink {
            href: "other.html".into(),
            title: "Other".into(),
            ..Default::default()
        }];

        let html = p.render().unwrap();
        assert!(html.contains("Sub"));
        assert!(html.contains("Backlinks"));
        assert!(html.contains("other.html"));
    }

    #[test]
    fn test_log_layout_inlines_bodies() {
        let mut p = page();
        p.layout_log = true;
        p.listing = vec![ListingLink {
            href: "entry1.html".into(),
            title: "Entry one".into(),
            body_html: "<p>inlined</p>".into(),
            date: "01 May 2024".into(),
            machine_date: "2024-05-01T00:00:00+00:00".into(),
            ..Default::default()
        }];

        let html = p.render().unwrap();
        assert!(html.contains("<p>inlined</p>"));
        assert!(html.contains("01 May 2024"));
    }

    #[test]
    fn test_tags_template() {
        let t = TagsTemplate {
            wiki_title: "Wiki".into(),
            root_crumb: "~".into(),
            footer: vec![],
            tags: vec![Tag {
                name: "x".into(),
                count: 2,
                links: vec![ListingLink {
                    href: "a.html".into(),
                    title: "A".into(),
                    ..Default::default()
                }],
            }],
        };

        let html = t.render().unwrap();
        assert!(html.contains("#x"));
        assert!(html.contains("a.html"));
    }
}

#![forbid(unsafe_code)]

//! Overlay link classification.
//!
//! A click on an overlay link is handled in-page only when the link points at
//! a fragment of the document being shown. Every such click suppresses the
//! browser's default action, even when the fragment names no element, so the
//! fragment never changes and no history entry is pushed. Links to other
//! documents navigate natively.

use siteui_core::anchor::anchor_from_href;

/// The parts of a resolved URL that identify a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUrl {
    pub origin: String,
    pub path: String,
    pub search: String,
}

impl DocumentUrl {
    #[must_use]
    pub fn new(origin: impl Into<String>, path: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            path: path.into(),
            search: search.into(),
        }
    }

    /// Check if both URLs address the same document, ignoring fragments.
    #[must_use]
    pub fn is_same_document(&self, other: &Self) -> bool {
        self.origin == other.origin
            && normalized_path(&self.path) == normalized_path(&other.path)
            && self.search == other.search
    }
}

fn normalized_path(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

/// What to do with a click on an overlay link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Leave the click to the browser.
    Native,
    /// Prevent the default action and navigate to this element id.
    InPage(String),
}

/// Classify a link by its raw `href`, its resolved URL and the current URL.
#[must_use]
pub fn classify_link(href: &str, target: &DocumentUrl, current: &DocumentUrl) -> LinkAction {
    let Some(anchor) = anchor_from_href(href) else {
        return LinkAction::Native;
    };
    if !target.is_same_document(current) {
        return LinkAction::Native;
    }
    LinkAction::InPage(anchor)
}

#[cfg(test)]
mod tests {
    use super::{DocumentUrl, LinkAction, classify_link};

    fn home() -> DocumentUrl {
        DocumentUrl::new("https://site.test", "/", "")
    }

    fn docs() -> DocumentUrl {
        DocumentUrl::new("https://site.test", "/docs", "")
    }

    #[test]
    fn bare_fragment_is_in_page() {
        assert_eq!(
            classify_link("#doc-install", &docs(), &docs()),
            LinkAction::InPage("doc-install".to_owned())
        );
    }

    #[test]
    fn unknown_fragment_is_still_in_page() {
        // The controller decides the id is unknown; the browser must not
        // follow the link and rewrite the fragment.
        assert_eq!(
            classify_link("#missing", &docs(), &docs()),
            LinkAction::InPage("missing".to_owned())
        );
    }

    #[test]
    fn other_document_navigates_natively() {
        assert_eq!(classify_link("/docs#doc-install", &docs(), &home()), LinkAction::Native);
        let cross_origin = DocumentUrl::new("https://other.test", "/docs", "");
        assert_eq!(
            classify_link("https://other.test/docs#x", &cross_origin, &docs()),
            LinkAction::Native
        );
        let other_query = DocumentUrl::new("https://site.test", "/docs", "?v=2");
        assert_eq!(classify_link("?v=2#x", &other_query, &docs()), LinkAction::Native);
    }

    #[test]
    fn explicit_path_to_current_document_is_in_page() {
        assert_eq!(
            classify_link("/docs#doc-faq", &docs(), &docs()),
            LinkAction::InPage("doc-faq".to_owned())
        );
        let empty_path = DocumentUrl::new("https://site.test", "", "");
        assert_eq!(
            classify_link("#top", &empty_path, &home()),
            LinkAction::InPage("top".to_owned())
        );
    }

    #[test]
    fn links_without_fragment_navigate_natively() {
        assert_eq!(classify_link("/docs", &docs(), &docs()), LinkAction::Native);
        assert_eq!(classify_link("#", &docs(), &docs()), LinkAction::Native);
    }
}

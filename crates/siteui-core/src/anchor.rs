#![forbid(unsafe_code)]

//! In-page anchor parsing.

use std::borrow::Cow;

/// Extract the target id from a link `href`.
///
/// Accepts `#id`, `page#id` and absolute URLs with a fragment. Returns `None`
/// when there is no fragment or it is empty. `%XX` escapes are decoded; an
/// escape sequence that does not decode to UTF-8 leaves the fragment as
/// written.
#[must_use]
pub fn anchor_from_href(href: &str) -> Option<String> {
    let (_, fragment) = href.trim().split_once('#')?;
    if fragment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(fragment).map_or_else(|_| fragment.to_owned(), Cow::into_owned);
    Some(decoded)
}

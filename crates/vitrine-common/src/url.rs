//! URL joining for canonical document links.
//!
//! The page model hands out document links that are either absolute or
//! site-relative (`/sale`). When a site base is configured, relative links are
//! joined onto it so rewritten markup never depends on the page it lands in.

use reqwest::Url;

/// Returns `true` for links that must never be joined onto a base.
///
/// Covers scheme-qualified URLs, protocol-relative URLs, fragments and
/// `mailto:`/`tel:` style links.
#[must_use]
pub fn is_absolute(href: &str) -> bool {
    if href.starts_with("//") || href.starts_with('#') {
        return true;
    }
    // "scheme:" where scheme is ASCII alpha followed by alnum / + - .
    href.find(':').is_some_and(|colon| {
        let scheme = &href[..colon];
        !scheme.is_empty()
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Resolve a potentially relative link against an optional site base.
///
/// # Algorithm
///
/// STEP 1: Absolute links (see [`is_absolute`]) are returned unchanged.
///
/// STEP 2: Without a base, the link is returned unchanged.
///
/// STEP 3: Otherwise the link is joined onto the base by RFC 3986 reference
/// resolution, so `..` segments, queries and fragments on the base are
/// handled. A base that does not parse leaves the link unchanged.
#[must_use]
pub fn resolve_url(href: &str, base_url: Option<&str>) -> String {
    // STEP 1
    if is_absolute(href) {
        return href.to_string();
    }

    // STEP 2
    let Some(base) = base_url.filter(|b| !b.is_empty()) else {
        return href.to_string();
    };

    // STEP 3
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map_or_else(
            |err| {
                tracing::debug!(base, href, error = %err, "cannot join link onto base");
                href.to_string()
            },
            String::from,
        )
}

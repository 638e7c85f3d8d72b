//! Local HTML → Markdown conversion for a selected content fragment.

use crate::dom::detach_all;
use crate::select::{NON_CONTENT_TAGS, collapse_blank_lines};
use htmd::HtmlToMarkdown;
use scraper::Html;

/// Embedded media that has no useful Markdown rendering.
pub const MEDIA_TAGS: &[&str] = &["img", "picture", "svg", "video", "iframe", "canvas"];

/// Remove embedded media (and any leftover scripts) from an HTML fragment.
pub fn strip_media(fragment_html: &str) -> String {
    let mut doc = Html::parse_fragment(fragment_html);
    detach_all(&mut doc, MEDIA_TAGS);
    detach_all(&mut doc, NON_CONTENT_TAGS);
    doc.root_element().inner_html()
}

/// Convert a fragment to Markdown without touching the network.
///
/// Returns `None` when conversion fails or leaves nothing but whitespace.
pub fn fragment_to_markdown(fragment_html: &str) -> Option<String> {
    let cleaned = strip_media(fragment_html);
    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "template"])
        .build();

    match converter.convert(&cleaned) {
        Ok(markdown) => {
            let markdown = collapse_blank_lines(markdown.trim());
            if markdown.is_empty() {
                None
            } else {
                Some(markdown)
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "local markdown conversion failed");
            None
        }
    }
}

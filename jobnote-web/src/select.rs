//! Choose the DOM region most likely to hold the job description.
//!
//! Selectors are tried in priority order and the first one that matches wins,
//! regardless of how much text it holds. When none match, the whole `<body>`
//! is used.

use crate::dom::detach_all;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Nodes that never carry readable content.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const PARAGRAPH_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "dl", "table", "blockquote", "pre",
    "section", "article", "header", "footer", "main", "aside", "nav", "form", "fieldset",
    "figure", "hr",
];

const LINE_TAGS: &[&str] = &[
    "div", "li", "tr", "dt", "dd", "caption", "figcaption", "address", "details", "summary",
    "thead", "tbody", "tfoot", "option", "label",
];

/// Outcome of content selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Outer HTML of the chosen element with non-content nodes removed.
    pub fragment_html: String,
    /// Block-aware plain text of the fragment.
    pub plain_text: String,
    /// Which selector matched; `None` when the body fallback was used.
    pub matched: Option<String>,
}

/// Ordered, first-match-wins list of CSS selectors.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    selectors: Vec<(String, Selector)>,
}

impl ContentSelector {
    /// Build from selector strings; entries that fail to parse are skipped.
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Self {
        let selectors = selectors
            .iter()
            .filter_map(|raw| {
                let raw = raw.as_ref().trim();
                match Selector::parse(raw) {
                    Ok(sel) => Some((raw.to_string(), sel)),
                    Err(err) => {
                        tracing::warn!(selector = raw, error = ?err, "skipping unparsable selector");
                        None
                    }
                }
            })
            .collect();
        Self { selectors }
    }

    /// Pick the content region of `html`.
    ///
    /// Returns `None` when the document has no body or the chosen region has
    /// no text at all.
    pub fn select(&self, html: &str) -> Option<Selection> {
        let mut doc = Html::parse_document(html);
        detach_all(&mut doc, NON_CONTENT_TAGS);

        let (element, matched) = match self
            .selectors
            .iter()
            .find_map(|(raw, sel)| doc.select(sel).next().map(|el| (el, raw.clone())))
        {
            Some((el, raw)) => (el, Some(raw)),
            None => (body_of(&doc)?, None),
        };

        match &matched {
            Some(raw) => tracing::info!(selector = %raw, "content region matched"),
            None => tracing::info!("no content selector matched, falling back to body"),
        }

        let plain_text = plain_text(element);
        if plain_text.is_empty() {
            tracing::warn!(matched = ?matched, "selected region has no text");
            return None;
        }

        Some(Selection {
            fragment_html: element.html(),
            plain_text,
            matched,
        })
    }
}

impl Default for ContentSelector {
    fn default() -> Self {
        Self::new(jobnote_common::DEFAULT_CONTENT_SELECTORS)
    }
}

fn body_of(doc: &Html) -> Option<ElementRef<'_>> {
    let body = Selector::parse("body").ok()?;
    doc.select(&body).next()
}

/// Render an element as plain text with line breaks between block-level runs.
pub fn plain_text(element: ElementRef<'_>) -> String {
    let mut builder = TextBuilder::default();
    builder.walk(element);
    builder.finish()
}

#[derive(Default)]
struct TextBuilder {
    out: String,
    current: String,
    pending_space: bool,
}

impl TextBuilder {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.element(child_el);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if name == "br" {
            self.flush();
            self.out.push('\n');
            return;
        }

        let paragraph = PARAGRAPH_TAGS.contains(&name);
        let line = LINE_TAGS.contains(&name);
        if paragraph {
            self.paragraph_break();
        } else if line {
            self.line_break();
        } else if matches!(name, "td" | "th") {
            self.pending_space = true;
        }

        self.walk(element);

        if paragraph {
            self.paragraph_break();
        } else if line {
            self.line_break();
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for word in text.split_whitespace() {
            if self.pending_space && !self.current.is_empty() {
                self.current.push(' ');
            }
            self.current.push_str(word);
            self.pending_space = true;
        }
        self.pending_space = text.ends_with(char::is_whitespace)
            || (self.pending_space && text.trim().is_empty());
    }

    fn flush(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.out.push_str(line);
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn line_break(&mut self) {
        self.flush();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn paragraph_break(&mut self) {
        self.line_break();
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        let lines: Vec<&str> = self.out.lines().map(str::trim).collect();
        let joined = lines.join("\n");
        collapse_blank_lines(&joined).trim().to_string()
    }
}

/// Normalize three or more consecutive newlines to a single blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    match Regex::new(r"\n{3,}") {
        Ok(re) => re.replace_all(text, "\n\n").into_owned(),
        Err(_) => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_selector() -> ContentSelector {
        ContentSelector::default()
    }

    #[test]
    fn prefers_specific_container_over_body() {
        let html = r#"<html><body>
            <nav>Home | Jobs</nav>
            <main><p>Generic main</p></main>
            <div id="jobDescriptionText"><p>Build compilers.</p></div>
        </body></html>"#;
        let sel = default_selector().select(html).unwrap();
        assert_eq!(sel.matched.as_deref(), Some("#jobDescriptionText"));
        assert_eq!(sel.plain_text, "Build compilers.");
        assert!(sel.fragment_html.starts_with("<div id=\"jobDescriptionText\">"));
    }

    #[test]
    fn first_listed_selector_wins_even_if_smaller() {
        let html = r#"<body>
            <article>Long article text with many words in it.</article>
            <div class="job-details">Short</div>
        </body>"#;
        let sel = default_selector().select(html).unwrap();
        assert_eq!(sel.matched.as_deref(), Some(".job-details"));
        assert_eq!(sel.plain_text, "Short");
    }

    #[test]
    fn falls_back_to_body_and_strips_scripts() {
        let html = r#"<html><head><style>p{}</style></head><body>
            <script>var tracking = 1;</script>
            <p>Hello</p><noscript>Enable JS</noscript><p>World</p>
        </body></html>"#;
        let sel = default_selector().select(html).unwrap();
        assert_eq!(sel.matched, None);
        assert_eq!(sel.plain_text, "Hello\n\nWorld");
        assert!(!sel.fragment_html.contains("tracking"));
        assert!(!sel.fragment_html.contains("Enable JS"));
    }

    #[test]
    fn block_elements_break_lines_and_blank_runs_collapse() {
        let html = r#"<body><div class="job-description">
            <h2>About   the role</h2>
            <ul><li>Rust</li><li>Tokio <b>async</b></li></ul>
            <p>Line one<br>Line two<br><br><br><br>Line three</p>
            <div><div><div>Nested</div></div></div>
        </div></body>"#;
        let sel = default_selector().select(html).unwrap();
        assert_eq!(
            sel.plain_text,
            "About the role\n\nRust\nTokio async\n\nLine one\nLine two\n\nLine three\n\nNested"
        );
        assert!(!sel.plain_text.contains("\n\n\n"));
    }

    #[test]
    fn empty_document_yields_none() {
        assert!(default_selector().select("<html><body>  </body></html>").is_none());
        assert!(default_selector()
            .select("<body><script>only()</script></body>")
            .is_none());
    }

    #[test]
    fn custom_selectors_skip_invalid_entries() {
        let selector = ContentSelector::new(&["[[bad", ".posting"]);
        let sel = selector
            .select(r#"<body><div class="posting">Posting body</div></body>"#)
            .unwrap();
        assert_eq!(sel.matched.as_deref(), Some(".posting"));
    }

    #[test]
    fn collapse_only_touches_long_runs() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\n\nc\nd"), "a\n\nb\n\nc\nd");
    }
}

// Content extraction: raw markup → bounded, provenance-tagged text.
//
// Strategies, in priority order:
//   1. hydration JSON via DOM lookup of the marker script
//   2. hydration JSON via regex (markup the parser does not surface)
//   3. block/defense page detection from <title>
//   4. visible body text with noise elements removed, truncated
//   5. leading slice of the raw input when nothing else yields text
//
// Pure: no I/O, no shared state, never fails.

use std::sync::LazyLock;

use pricescout_common::{Extraction, ExtractionStrategy};
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// Element id of the embedded hydration payload (Next.js convention).
pub const HYDRATION_MARKER: &str = "__NEXT_DATA__";

/// Appended when text is cut at the character limit.
pub const TRUNCATION_MARKER: &str = "\n[... content truncated ...]";

/// Retail domains known to embed their search state as hydration JSON.
const HYDRATION_DOMAINS: &[&str] = &["takealot.com", "makro.co.za", "game.co.za"];

/// Elements whose text is never user-visible content.
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "svg", "iframe", "template",
];

/// Elements that start a new line of text.
const BLOCK_TAGS: &[&str] = &[
    "body", "div", "p", "li", "ul", "ol", "tr", "td", "th", "table", "section", "article",
    "main", "aside", "h1", "h2", "h3", "h4", "h5", "h6", "dd", "dt", "figure", "figcaption",
    "blockquote", "pre", "form", "label",
];

static HYDRATION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("script#{HYDRATION_MARKER}")).expect("valid selector")
});
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

static HYDRATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?is)<script[^>]*\bid\s*=\s*["']?{HYDRATION_MARKER}(?:["'\s/][^>]*)?>(.*?)</script>"#
    ))
    .expect("valid regex")
});

static BLOCK_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)service unavailable|^\s*503\b|error 503|access denied|attention required|just a moment|robot check|are you a robot|pardon our interruption|request blocked|captcha",
    )
    .expect("valid regex")
});

/// Does this domain embed hydration JSON in its server-rendered markup?
pub fn embeds_hydration(domain: &str) -> bool {
    let key = domain.strip_prefix("www.").unwrap_or(domain);
    HYDRATION_DOMAINS
        .iter()
        .any(|d| key == *d || key.ends_with(&format!(".{d}")))
}

/// Cheap check for the hydration marker in raw markup.
pub fn has_hydration_marker(raw: &str) -> bool {
    HYDRATION_RE.is_match(raw)
}

/// Hydration payload found by DOM lookup.
pub(crate) fn hydration_from_dom(document: &Html) -> Option<String> {
    let script = document.select(&HYDRATION_SELECTOR).next()?;
    let json: String = script.text().collect();
    let json = json.trim();
    (!json.is_empty()).then(|| json.to_string())
}

/// Hydration payload found by pattern match on the raw text.
pub(crate) fn hydration_from_markup(raw: &str) -> Option<String> {
    let json = HYDRATION_RE.captures(raw)?.get(1)?.as_str().trim();
    (!json.is_empty()).then(|| json.to_string())
}

fn page_title(document: &Html) -> Option<String> {
    let title: String = document.select(&TITLE_SELECTOR).next()?.text().collect();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

pub(crate) fn is_block_title(title: &str) -> bool {
    BLOCK_TITLE_RE.is_match(title)
}

/// Visible text of `<body>`, one line per block element.
pub(crate) fn visible_body_text(document: &Html) -> String {
    let Some(body) = document.select(&BODY_SELECTOR).next() else {
        return String::new();
    };

    let mut out = String::new();
    let mut current_block = None;

    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let mut block = None;
        let mut noisy = false;
        for ancestor in node.ancestors() {
            if let Some(element) = ancestor.value().as_element() {
                let name = element.name();
                if NOISE_TAGS.contains(&name) {
                    noisy = true;
                    break;
                }
                if block.is_none() && BLOCK_TAGS.contains(&name) {
                    block = Some(ancestor.id());
                }
            }
        }
        if noisy {
            continue;
        }

        let mut words = text.split_whitespace().peekable();
        if words.peek().is_none() {
            continue;
        }

        if !out.is_empty() {
            out.push(if block == current_block { ' ' } else { '\n' });
        }
        current_block = block;

        for (i, word) in words.enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
    }

    out
}

#[derive(Debug, Clone)]
pub struct ContentExtractor {
    max_chars: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(50_000)
    }
}

impl ContentExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Turn raw markup into a single extraction using the first strategy
    /// that yields something.
    pub fn extract(&self, raw: &str, source_url: &str) -> Extraction {
        match self.extract_structured(raw, source_url) {
            Some(extraction) => extraction,
            None => {
                debug!(url = source_url, bytes = raw.len(), "No structured text, keeping raw input");
                Extraction::new(source_url, ExtractionStrategy::Raw, self.truncate(raw.trim()))
            }
        }
    }

    fn extract_structured(&self, raw: &str, source_url: &str) -> Option<Extraction> {
        let document = Html::parse_document(raw);

        if let Some(json) = hydration_from_dom(&document) {
            debug!(url = source_url, bytes = json.len(), "Hydration data found");
            return Some(Extraction::new(
                source_url,
                ExtractionStrategy::Hydration,
                self.truncate(&json),
            ));
        }

        if let Some(json) = hydration_from_markup(raw) {
            debug!(url = source_url, bytes = json.len(), "Hydration data found by pattern");
            return Some(Extraction::new(
                source_url,
                ExtractionStrategy::HydrationRegex,
                self.truncate(&json),
            ));
        }

        if let Some(title) = page_title(&document) {
            if is_block_title(&title) {
                debug!(url = source_url, title, "Block page detected");
                return Some(Extraction::new(
                    source_url,
                    ExtractionStrategy::Blocked,
                    blocked_marker(source_url, &title),
                ));
            }
        }

        let text = visible_body_text(&document);
        if text.is_empty() {
            return None;
        }

        Some(Extraction::new(
            source_url,
            ExtractionStrategy::PageText,
            self.truncate(&text),
        ))
    }

    /// Cut `text` at `max_chars` characters, appending the truncation marker.
    pub fn truncate(&self, text: &str) -> String {
        match text.char_indices().nth(self.max_chars) {
            Some((end, _)) => format!("{}{}", &text[..end], TRUNCATION_MARKER),
            None => text.to_string(),
        }
    }
}

fn blocked_marker(source_url: &str, title: &str) -> String {
    format!(
        "BLOCKED: {source_url} returned a defensive page (title: \"{title}\"). \
         No product data was retrieved from this source."
    )
}

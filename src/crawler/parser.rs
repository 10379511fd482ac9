//! HTML parser for quote listing pages
//!
//! This module handles parsing a listing page to extract:
//! - Quotes (id, approval timestamp, text) in page order
//! - The total page count advertised by the pager, when present

use scraper::{ElementRef, Html, Node, Selector};

/// A single quote extracted from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Quote id without the leading `#`
    pub id: String,

    /// Approval timestamp as displayed by the site
    pub timestamp: String,

    /// Quote body with line breaks as `\n`
    pub text: String,
}

/// Extracted information from a listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Quotes in page order (newest first on the live site)
    pub records: Vec<Record>,

    /// Total number of pages according to the pager
    pub page_count: Option<u32>,
}

/// Parses a listing page
///
/// Never fails: a page without quotes yields an empty list, and a quote with
/// missing parts yields empty strings for those parts.
///
/// # Example
///
/// ```
/// use quote_archiver::crawler::parse_listing;
///
/// let html = r##"<div class="quote">
///     <div class="actions"><span class="date">2016-05-01 10:00</span><a class="id">#42</a></div>
///     <div class="text">hello<br>world</div>
/// </div>"##;
/// let listing = parse_listing(html);
/// assert_eq!(listing.records[0].id, "42");
/// assert_eq!(listing.records[0].text, "hello\nworld");
/// ```
pub fn parse_listing(html: &str) -> ParsedListing {
    let document = Html::parse_document(html);

    ParsedListing {
        records: extract_records(&document),
        page_count: extract_page_count(&document),
    }
}

/// Extracts every `.quote` block in document order
fn extract_records(document: &Html) -> Vec<Record> {
    let (Some(quote_selector), Some(id_selector), Some(date_selector), Some(text_selector)) = (
        selector(".quote"),
        selector(".actions .id"),
        selector(".actions .date"),
        selector(".text"),
    ) else {
        return Vec::new();
    };

    document
        .select(&quote_selector)
        .map(|quote| {
            let id = first_text(quote, &id_selector).replace('#', "");
            let timestamp = first_text(quote, &date_selector);
            let text = quote
                .select(&text_selector)
                .next()
                .map(quote_body)
                .unwrap_or_default();

            Record {
                id: id.trim().to_string(),
                timestamp: timestamp.trim().to_string(),
                text,
            }
        })
        .collect()
}

/// Reads the page count from the pager's current-page input
fn extract_page_count(document: &Html) -> Option<u32> {
    let pager_selector = selector(".pager .current .page")?;
    let element = document.select(&pager_selector).next()?;

    let raw = match element.value().attr("value") {
        Some(value) => value.to_string(),
        None => element.text().collect::<String>(),
    };

    raw.trim().parse::<u32>().ok().filter(|count| *count > 0)
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|element| element.text().collect())
        .unwrap_or_default()
}

/// Flattens the quote body, turning `<br>` into newlines
fn quote_body(element: ElementRef<'_>) -> String {
    let mut body = String::new();
    collect_text(element, &mut body);
    body.replace("\r\n", "\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name().eq_ignore_ascii_case("br") => out.push('\n'),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

use scraper::{Html, Selector};

/// Pull the raw `href` values out of every anchor in the document, in
/// document order. One pass per call; parsing holds no state between
/// invocations.
///
/// The parser is permissive: malformed markup yields whatever anchors
/// can still be located, and an unparseable document yields nothing
/// rather than an error.
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// The trimmed text of the document's `<title>`, if it has a non-empty
/// one.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").unwrap();

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

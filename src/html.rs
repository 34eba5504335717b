// src/html.rs
// =============================================================================
// This module pulls the raw link references out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Nothing is resolved here. The href values are returned exactly as written
// (after the HTML parser has decoded entities like &amp;), in document order,
// together with the page's <base href> if it declares one. Resolution and
// classification happen in the links module.
// =============================================================================

use scraper::{Html, Selector};

// The link-related raw data of one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReferences {
    /// href of every <a> element, in document order
    pub hrefs: Vec<String>,
    /// href of the first <base> element, if any
    pub base: Option<String>,
}

// Extracts all <a href> values and the <base href> from HTML content
//
// Example:
//   html = "<base href='/docs/'><a href='intro'>Intro</a>"
//   result = PageReferences { hrefs: ["intro"], base: Some("/docs/") }
pub fn extract_references(html: &str) -> PageReferences {
    let document = Html::parse_document(html);

    PageReferences {
        hrefs: select_hrefs(&document, "a[href]"),
        base: select_hrefs(&document, "base[href]").into_iter().next(),
    }
}

// Returns the href attribute of every element matching the selector
fn select_hrefs(document: &Html, selector: &str) -> Vec<String> {
    let selector = match Selector::parse(selector) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why not resolve URLs here with Url::join?
//    - The url crate follows the WHATWG URL standard, which has its own
//      opinions on which characters to escape and on "//" links
//    - We want our own rules (see links/resolve.rs), so this module only
//      collects the raw strings
//
// 2. Why only the first <base>?
//    - Browsers ignore every <base href> after the first one
//
// 3. Where did the selector unwrap() go?
//    - Selector::parse can only fail for a bad selector, and ours are
//      constants, but returning an empty list keeps this function panic-free
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_document_order() {
        let html = r#"
            <a href="/">Home</a>
            <p><a href="https://twitter.com">Twitter</a></p>
            <a href="mailto:hello@example.com">Mail</a>
            <a name="anchor-without-href">No href</a>
            <a href="/faqs">FAQ</a>
        "#;
        let page = extract_references(html);
        assert_eq!(
            page.hrefs,
            vec!["/", "https://twitter.com", "mailto:hello@example.com", "/faqs"]
        );
        assert_eq!(page.base, None);
    }

    #[test]
    fn test_first_base_wins() {
        let html = r#"
            <html><head>
                <base href="http://relativewithbase.com/">
                <base href="http://ignored.com/">
            </head>
            <body><a href="about">About</a></body></html>
        "#;
        let page = extract_references(html);
        assert_eq!(page.base.as_deref(), Some("http://relativewithbase.com/"));
        assert_eq!(page.hrefs, vec!["about"]);
    }

    #[test]
    fn test_entities_decoded_and_raw_text_kept() {
        let html = r#"<a href="/search?q=a&amp;b=c">x</a><a href="españa.asp">y</a><a href="">z</a>"#;
        let page = extract_references(html);
        assert_eq!(page.hrefs, vec!["/search?q=a&b=c", "españa.asp", ""]);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(extract_references(""), PageReferences::default());
    }
}

// src/lib.rs
// =============================================================================
// link-sorter: resolve every link on a web page and sort it into internal,
// external or non-HTTP.
//
// Modules:
// - links: the resolver and classifier (pure, no I/O)
// - html: pulls href values and <base href> out of an HTML document
// - fetch: downloads pages over HTTP(S)
//
// Typical use:
//
//   let page = html::extract_references(&body);
//   let document = ResolvedUrl::parse("http://example.com/")?;
//   let buckets = LinkClassifier::default()
//       .classify(&page.hrefs, &document, page.base.as_deref());
// =============================================================================

pub mod fetch;
pub mod html;
pub mod links;

pub use links::{
    classify, ClassifierConfig, LinkBuckets, LinkClassifier, LinkError, MalformedPolicy,
    Reference, ResolvedUrl,
};

// src/links/classify.rs
// =============================================================================
// This module sorts a page's links into three buckets:
//
//   internal  - http(s) links to the same host as the page
//   external  - http(s) links to any other host
//   non_http  - mailto:, javascript:, ftp:, ... and salvaged broken links
//
// One pass over the references in document order. Each reference lands in at
// most one bucket, and the order inside a bucket is the order the links
// appeared in the page.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::error::LinkError;
use super::resolve::{
    is_web_scheme, leading_scheme, resolve, trim_reference, BaseContext, ResolveOutcome,
    ResolvedUrl,
};
use super::encode::{self, Component};

// What to do with an href that can't be resolved
//
// Broken hrefs come in two flavours. Some are plain garbage ("http://",
// "<b>oops</b>") and some are real non-web links with junk glued to the
// front ("<p>ftp://ftp.cdrom.com"). The policy picks which ones survive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop every unresolvable reference
    Drop,
    /// Keep every unresolvable reference in non_http, percent-encoded,
    /// unless nothing is left once markup is stripped
    Encode,
    /// Keep it in non_http only if, with markup stripped, it starts with a
    /// non-web scheme; drop it otherwise
    #[default]
    Lenient,
}

/// Settings for the classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
}

/// Where a single reference ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Internal(ResolvedUrl),
    External(ResolvedUrl),
    NonHttp(String),
    /// In no bucket at all
    Dropped,
}

/// The three link lists for one document, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBuckets {
    pub internal: Vec<String>,
    pub external: Vec<String>,
    pub non_http: Vec<String>,
}

impl LinkBuckets {
    pub fn push(&mut self, classification: Classification) {
        match classification {
            Classification::Internal(url) => self.internal.push(url.to_string()),
            Classification::External(url) => self.external.push(url.to_string()),
            Classification::NonHttp(link) => self.non_http.push(link),
            Classification::Dropped => {}
        }
    }

    /// Total number of links across all three buckets
    pub fn len(&self) -> usize {
        self.internal.len() + self.external.len() + self.non_http.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinkClassifier {
    config: ClassifierConfig,
}

impl LinkClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        LinkClassifier { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    // Picks the URL relative links are resolved against
    //
    // A declared <base href> wins when it resolves (against the document URL)
    // to an absolute web URL. Anything else falls back to the document URL.
    pub fn effective_base(&self, document: &ResolvedUrl, declared_base: Option<&str>) -> BaseContext {
        let document_base = BaseContext::for_document(document);
        let Some(declared) = declared_base else {
            return document_base;
        };

        let reason = match resolve(declared, &document_base) {
            ResolveOutcome::Absolute(url) => return BaseContext::new(url, document.scheme()),
            ResolveOutcome::Opaque(_) => "not a web URL".to_string(),
            ResolveOutcome::Unresolvable(err) => err.to_string(),
        };

        let err = LinkError::InvalidBase {
            base: declared.to_string(),
            reason,
        };
        warn!(error = %err, "Ignoring declared base, using the document URL");
        document_base
    }

    /// Resolves and buckets one reference
    pub fn classify_one(
        &self,
        reference: &str,
        base: &BaseContext,
        document: &ResolvedUrl,
    ) -> Classification {
        match resolve(reference, base) {
            ResolveOutcome::Absolute(url) if url.same_host(document) => Classification::Internal(url),
            ResolveOutcome::Absolute(url) => Classification::External(url),
            ResolveOutcome::Opaque(link) => Classification::NonHttp(link),
            ResolveOutcome::Unresolvable(err) => self.salvage(reference, &err),
        }
    }

    /// Classifies every reference of a document
    #[instrument(skip_all, fields(document = %document))]
    pub fn classify<I>(
        &self,
        references: I,
        document: &ResolvedUrl,
        declared_base: Option<&str>,
    ) -> LinkBuckets
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let base = self.effective_base(document, declared_base);

        let mut buckets = LinkBuckets::default();
        let mut dropped = 0usize;
        for reference in references {
            let classification = self.classify_one(reference.as_ref(), &base, document);
            if matches!(classification, Classification::Dropped) {
                dropped += 1;
            }
            buckets.push(classification);
        }

        debug!(
            internal = buckets.internal.len(),
            external = buckets.external.len(),
            non_http = buckets.non_http.len(),
            dropped,
            "Classified links"
        );
        buckets
    }

    // Applies the malformed-input policy to an unresolvable reference
    fn salvage(&self, reference: &str, err: &LinkError) -> Classification {
        let stripped = strip_markup(reference);
        let keep = match self.config.malformed_policy {
            MalformedPolicy::Drop => false,
            MalformedPolicy::Encode => !stripped.is_empty(),
            MalformedPolicy::Lenient => {
                leading_scheme(&stripped).is_some_and(|scheme| !is_web_scheme(scheme))
            }
        };

        if keep {
            let encoded = encode::normalize(trim_reference(reference), Component::Opaque);
            debug!(error = %err, link = %encoded, "Keeping malformed reference as non-HTTP");
            Classification::NonHttp(encoded)
        } else {
            debug!(error = %err, "Dropping malformed reference");
            Classification::Dropped
        }
    }
}

/// Classifies references with the default configuration
///
/// Fails only when `document_url` itself isn't an absolute http(s) URL.
pub fn classify<I>(
    references: I,
    document_url: &str,
    declared_base: Option<&str>,
) -> Result<LinkBuckets, LinkError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let document = ResolvedUrl::parse(document_url)?;
    Ok(LinkClassifier::default().classify(references, &document, declared_base))
}

// Removes tags and stray markup characters
//
//   "<p>ftp://ftp.cdrom.com"  -> "ftp://ftp.cdrom.com"
//   "<b></b>"                 -> ""
//   "/faqs\""                 -> "/faqs"
fn strip_markup(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len());
    let mut rest = reference;

    while let Some(idx) = rest.find(|c: char| matches!(c, '<' | '>' | '"')) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        rest = if rest[idx..].starts_with('<') {
            // Skip a whole tag when it is closed, otherwise just the '<'
            match after.find('>') {
                Some(end) => &after[end + 1..],
                None => after,
            }
        } else {
            after
        };
    }
    out.push_str(rest);

    trim_reference(&out).to_string()
}

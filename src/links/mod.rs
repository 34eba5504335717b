// src/links/mod.rs
// =============================================================================
// Link resolution and classification.
//
// Submodules:
// - encode: percent-encoding normalization
// - reference: raw href values
// - resolve: turns one href into an absolute URL, an opaque link, or nothing
// - classify: runs resolve over a whole document and fills the buckets
// - error: the error type shared by all of the above
// =============================================================================

mod classify;
mod encode;
mod error;
mod reference;
mod resolve;

pub use classify::{
    classify, Classification, ClassifierConfig, LinkBuckets, LinkClassifier, MalformedPolicy,
};
pub use encode::{lossless_utf8, normalize, Component};
pub use error::LinkError;
pub use reference::Reference;
pub use resolve::{resolve, BaseContext, ResolveOutcome, ResolvedUrl};

// src/links/resolve.rs
// =============================================================================
// This module turns one raw href into something we can classify.
//
// Steps, in order:
// 1. Look for a "scheme:" prefix. Anything that isn't http/https (mailto:,
//    javascript:, ftp:, skype:, ...) is passed through as an opaque link.
// 2. "//host/path" takes the scheme of the document the link was found in.
// 3. "http://..." and "https://..." are split into their parts.
// 4. Everything else is a relative reference and gets merged with the base
//    (RFC 3986 section 5.2).
// 5. Path, query and fragment are percent-encoded (see encode.rs).
//
// resolve() never fails: broken input comes back as Unresolvable and the
// classifier decides what to do with it.
// =============================================================================

use std::fmt;

use url::Host;

use super::encode::{self, Component};
use super::error::LinkError;

// An absolute http(s) URL split into its parts
//
// All parts except the host are ASCII-safe (percent-encoded). The host is
// kept as written so output doesn't change its casing; `host_key` is the
// lower-cased, IDNA-mapped form used to compare hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    scheme: String,
    userinfo: Option<String>,
    host: String,
    host_key: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl ResolvedUrl {
    /// Parses an absolute http(s) URL, typically the URL of the document
    /// whose links are being classified.
    pub fn parse(input: &str) -> Result<Self, LinkError> {
        let trimmed = trim_reference(input);
        let invalid = |reason: String| LinkError::InvalidDocumentUrl {
            url: input.to_string(),
            reason,
        };

        match split_scheme(trimmed) {
            SchemeToken::Valid(scheme) if is_web_scheme(scheme) => {
                parse_absolute(trimmed, scheme, trimmed).map_err(|e| invalid(e.to_string()))
            }
            _ => Err(invalid("not an absolute http(s) URL".to_string())),
        }
    }

    // Builds the URL from raw (unencoded) parts
    fn assemble(
        scheme: &str,
        authority: Authority<'_>,
        host_key: String,
        path: &str,
        query: Option<&str>,
        fragment: Option<&str>,
    ) -> Self {
        let path = remove_dot_segments(path);
        let path = if path.is_empty() {
            "/".to_string()
        } else {
            encode::normalize(&path, Component::Path)
        };

        // Non-ASCII hosts are written in their punycode form
        let host = if authority.host.is_ascii() {
            authority.host.to_string()
        } else {
            host_key.clone()
        };

        ResolvedUrl {
            scheme: scheme.to_ascii_lowercase(),
            userinfo: authority
                .userinfo
                .map(|u| encode::normalize(u, Component::Userinfo)),
            host,
            host_key,
            port: authority.port,
            path,
            query: query.map(|q| encode::normalize(q, Component::Query)),
            fragment: fragment.map(|f| encode::normalize(f, Component::Fragment)),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Case-insensitive host comparison (ports are not compared)
    pub fn same_host(&self, other: &ResolvedUrl) -> bool {
        self.host_key == other.host_key
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(userinfo) = &self.userinfo {
            write!(f, "{}@", userinfo)?;
        }
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

// The URL relative references are resolved against
//
// Either the document's own URL or the <base href> it declares. We also keep
// the document's scheme because "//host/path" links take the scheme of the
// page they appear on, not of the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseContext {
    url: ResolvedUrl,
    is_directory: bool,
    document_scheme: String,
}

impl BaseContext {
    pub fn new(url: ResolvedUrl, document_scheme: &str) -> Self {
        let is_directory = url.path.ends_with('/');
        BaseContext {
            url,
            is_directory,
            document_scheme: document_scheme.to_ascii_lowercase(),
        }
    }

    /// Base for a document without a usable <base> element
    pub fn for_document(document: &ResolvedUrl) -> Self {
        BaseContext::new(document.clone(), document.scheme())
    }

    pub fn url(&self) -> &ResolvedUrl {
        &self.url
    }

    /// True when the base path ends in '/'
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    // Joins a relative path onto the base path
    //
    //   directory: /company/  + about -> /company/about
    //   document:  /company   + about -> /about
    fn merge_path(&self, relative: &str) -> String {
        let base_path = &self.url.path;
        if self.is_directory {
            format!("{}{}", base_path, relative)
        } else {
            let cut = base_path.rfind('/').map_or(0, |i| i + 1);
            format!("{}{}", &base_path[..cut], relative)
        }
    }
}

/// What a single reference resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// An absolute http(s) URL
    Absolute(ResolvedUrl),
    /// A non-web link, minimally encoded
    Opaque(String),
    /// Nothing usable could be made of it
    Unresolvable(LinkError),
}

// Resolves one reference against a base
//
// Examples (base = http://example.com/company):
//   "about"              -> Absolute(http://example.com/about)
//   "/faqs"              -> Absolute(http://example.com/faqs)
//   "//yahoo.com/"       -> Absolute(http://yahoo.com/)
//   "mailto:a@b.com"     -> Opaque("mailto:a@b.com")
//   "http://"            -> Unresolvable(...)
pub fn resolve(reference: &str, base: &BaseContext) -> ResolveOutcome {
    let reference = trim_reference(reference);
    if reference.is_empty() {
        return ResolveOutcome::Unresolvable(LinkError::malformed(reference, "empty reference"));
    }

    let resolved = match split_scheme(reference) {
        SchemeToken::Valid(scheme) if is_web_scheme(scheme) => {
            parse_absolute(reference, scheme, reference)
        }
        SchemeToken::Valid(_) => {
            return ResolveOutcome::Opaque(encode::normalize(reference, Component::Opaque));
        }
        SchemeToken::Invalid => Err(LinkError::malformed(reference, "invalid scheme")),
        SchemeToken::None if reference.starts_with("//") => {
            let absolute = format!("{}:{}", base.document_scheme, reference);
            parse_absolute(&absolute, &base.document_scheme, reference)
        }
        SchemeToken::None => merge_relative(reference, base),
    };

    match resolved {
        Ok(url) => ResolveOutcome::Absolute(url),
        Err(err) => ResolveOutcome::Unresolvable(err),
    }
}

// HTML strips leading/trailing whitespace and control characters from hrefs
pub(crate) fn trim_reference(reference: &str) -> &str {
    reference.trim_matches(|c: char| c.is_ascii_whitespace() || c.is_ascii_control())
}

pub(crate) fn is_web_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

/// Returns the scheme if the text starts with a valid "scheme:" token
pub(crate) fn leading_scheme(text: &str) -> Option<&str> {
    match split_scheme(text) {
        SchemeToken::Valid(scheme) => Some(scheme),
        SchemeToken::None | SchemeToken::Invalid => None,
    }
}

enum SchemeToken<'a> {
    /// No ':' before the first '/', '?' or '#'
    None,
    Valid(&'a str),
    /// Something sits before the ':' but it isn't a scheme ("<p>ftp:")
    Invalid,
}

fn split_scheme(reference: &str) -> SchemeToken<'_> {
    let Some(colon) = reference.find(':') else {
        return SchemeToken::None;
    };
    let candidate = &reference[..colon];
    if candidate.contains(|c: char| matches!(c, '/' | '?' | '#')) {
        return SchemeToken::None;
    }

    // scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
    let mut chars = candidate.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));

    if valid {
        SchemeToken::Valid(candidate)
    } else {
        SchemeToken::Invalid
    }
}

// Markup left over from a broken attribute: href="<p>..." or href="/a"b"
fn check_markup(reference: &str) -> Result<(), LinkError> {
    if reference.contains(|c: char| matches!(c, '<' | '>' | '"')) {
        Err(LinkError::malformed(reference, "contains markup"))
    } else {
        Ok(())
    }
}

struct Authority<'a> {
    userinfo: Option<&'a str>,
    host: &'a str,
    port: Option<u16>,
}

// Splits "user@host:port"
fn split_authority(authority: &str) -> Result<Authority<'_>, &'static str> {
    let (userinfo, host_port) = match authority.rfind('@') {
        Some(at) => (Some(&authority[..at]), &authority[at + 1..]),
        None => (None, authority),
    };

    let (host, port) = if host_port.starts_with('[') {
        let close = host_port.find(']').ok_or("unterminated IPv6 literal")?;
        host_port.split_at(close + 1)
    } else {
        match host_port.rfind(':') {
            Some(colon) => host_port.split_at(colon),
            None => (host_port, ""),
        }
    };

    let port = match port.strip_prefix(':') {
        None if port.is_empty() => None,
        None => return Err("unexpected text after host"),
        Some("") => None,
        Some(digits) if digits.bytes().all(|b| b.is_ascii_digit()) => {
            Some(digits.parse::<u16>().map_err(|_| "port out of range")?)
        }
        Some(_) => return Err("invalid port"),
    };

    Ok(Authority {
        userinfo,
        host,
        port,
    })
}

// Lower-cased, IDNA-mapped host used for comparisons
fn host_key(host: &str) -> Result<String, &'static str> {
    if host.is_empty() {
        return Err("empty host");
    }
    Host::parse(host)
        .map(|h| h.to_string())
        .map_err(|_| "invalid host")
}

struct RawParts<'a> {
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

// Splits "path?query#fragment"; the first '#' wins over any later '?'
fn split_parts(text: &str) -> RawParts<'_> {
    let (rest, fragment) = match text.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (text, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    RawParts {
        path,
        query,
        fragment,
    }
}

// Parses "scheme://authority/path?query#fragment"
//
// `reference` is what the document actually contained; errors name it
// rather than the scheme-prefixed text for protocol-relative links.
fn parse_absolute(text: &str, scheme: &str, reference: &str) -> Result<ResolvedUrl, LinkError> {
    // Leftover tags or quotes mean the attribute was broken
    check_markup(reference)?;

    // Skip "scheme:" and require the "//" that introduces the host
    let after_scheme = &text[scheme.len() + 1..];
    let rest = after_scheme
        .strip_prefix("//")
        .ok_or_else(|| LinkError::malformed(reference, "missing '//' after web scheme"))?;

    // The authority (user@host:port) runs up to the first '/', '?' or '#'
    let authority_end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    // Validate the host; an empty or unparseable host makes the link unusable
    let authority = split_authority(authority).map_err(|reason| LinkError::malformed(reference, reason))?;
    let host_key = host_key(authority.host).map_err(|reason| LinkError::malformed(reference, reason))?;
    // Whatever is left is path?query#fragment, encoded in assemble()
    let parts = split_parts(tail);

    Ok(ResolvedUrl::assemble(
        scheme,
        authority,
        host_key,
        parts.path,
        parts.query,
        parts.fragment,
    ))
}

// Resolves a reference with no scheme and no "//" (RFC 3986, 5.2.2)
fn merge_relative(reference: &str, base: &BaseContext) -> Result<ResolvedUrl, LinkError> {
    check_markup(reference)?;

    // Split the reference; only the parts it actually has replace the base's
    let parts = split_parts(reference);
    let base_url = &base.url;

    let (path, query) = if parts.path.is_empty() {
        // "#frag" keeps the base query, "?q" replaces it
        let query = parts.query.or(base_url.query.as_deref());
        (base_url.path.clone(), query)
    } else if parts.path.starts_with('/') {
        // Root-relative: the base path is replaced entirely
        (parts.path.to_string(), parts.query)
    } else {
        // Plain relative: appended to the base directory
        (base.merge_path(parts.path), parts.query)
    };

    // Scheme and host always come from the base
    let authority = Authority {
        userinfo: base_url.userinfo.as_deref(),
        host: &base_url.host,
        port: base_url.port,
    };

    Ok(ResolvedUrl::assemble(
        &base_url.scheme,
        authority,
        base_url.host_key.clone(),
        &path,
        query,
        parts.fragment,
    ))
}

// Removes "." and ".." segments from an absolute path (RFC 3986, 5.2.4)
//
//   /a/b/../c  -> /a/c
//   /a/./b/    -> /a/b/
//   /a/b/..    -> /a/
//   /../a      -> /a
fn remove_dot_segments(path: &str) -> String {
    let absolute = path.starts_with('/');
    let relative = path.strip_prefix('/').unwrap_or(path);

    let mut stack: Vec<&str> = Vec::new();
    let mut trailing_slash = false;
    for segment in relative.split('/') {
        match segment {
            "." => trailing_slash = true,
            ".." => {
                stack.pop();
                trailing_slash = true;
            }
            other => {
                stack.push(other);
                trailing_slash = false;
            }
        }
    }

    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    out.push_str(&stack.join("/"));
    if trailing_slash && !stack.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> BaseContext {
        BaseContext::for_document(&ResolvedUrl::parse(url).unwrap())
    }

    fn absolute(reference: &str, base_url: &str) -> String {
        match resolve(reference, &base(base_url)) {
            ResolveOutcome::Absolute(url) => url.to_string(),
            other => panic!("expected absolute URL for {:?}, got {:?}", reference, other),
        }
    }

    #[test]
    fn test_parse_document_url() {
        let url = ResolvedUrl::parse("http://example.com").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.path(), "/");
        assert_eq!(url.to_string(), "http://example.com/");
    }

    #[test]
    fn test_parse_rejects_non_web_document() {
        assert!(matches!(
            ResolvedUrl::parse("ftp://example.com/"),
            Err(LinkError::InvalidDocumentUrl { .. })
        ));
        assert!(ResolvedUrl::parse("/relative").is_err());
        assert!(ResolvedUrl::parse("http://").is_err());
    }

    #[test]
    fn test_document_vs_directory_base() {
        assert_eq!(absolute("about", "http://x.com/company"), "http://x.com/about");
        assert_eq!(absolute("about", "http://x.com/company/"), "http://x.com/company/about");
        assert_eq!(absolute("about", "http://x.com"), "http://x.com/about");
        assert!(!base("http://x.com/company").is_directory());
        assert!(base("http://x.com/company/").is_directory());
    }

    #[test]
    fn test_root_relative() {
        assert_eq!(absolute("/sitemap", "http://x.com/company/"), "http://x.com/sitemap");
        assert_eq!(absolute("/", "http://example.com"), "http://example.com/");
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(absolute("../about", "http://x.com/a/b/c"), "http://x.com/a/about");
        assert_eq!(absolute("./faqs", "http://x.com/a/"), "http://x.com/a/faqs");
        assert_eq!(absolute("../../../../x", "http://x.com/a/b"), "http://x.com/x");
        assert_eq!(absolute("..", "http://x.com/a/b/c"), "http://x.com/a/");
    }

    #[test]
    fn test_remove_dot_segments() {
        assert_eq!(remove_dot_segments("/a/b/../c"), "/a/c");
        assert_eq!(remove_dot_segments("/a/./b/"), "/a/b/");
        assert_eq!(remove_dot_segments("/a/b/.."), "/a/");
        assert_eq!(remove_dot_segments("/../a"), "/a");
        assert_eq!(remove_dot_segments("/a//b"), "/a//b");
        assert_eq!(remove_dot_segments("/"), "/");
    }

    #[test]
    fn test_fragment_and_query_only() {
        let page = "http://x.com/search?q=1";
        assert_eq!(absolute("#top", page), "http://x.com/search?q=1#top");
        assert_eq!(absolute("?q=2", page), "http://x.com/search?q=2");
        assert_eq!(absolute("?q=2#r", "http://x.com/a/b#old"), "http://x.com/a/b?q=2#r");
    }

    #[test]
    fn test_protocol_relative_uses_document_scheme() {
        assert_eq!(absolute("//yahoo.com/", "http://protocol-relative.com"), "http://yahoo.com/");
        assert_eq!(absolute("//yahoo.com/", "https://protocol-relative.com"), "https://yahoo.com/");

        // The <base> says http, the page itself was served over https
        let document = ResolvedUrl::parse("https://site.com/").unwrap();
        let declared = ResolvedUrl::parse("http://cdn.site.com/").unwrap();
        let ctx = BaseContext::new(declared, document.scheme());
        match resolve("//yahoo.com/x", &ctx) {
            ResolveOutcome::Absolute(url) => assert_eq!(url.to_string(), "https://yahoo.com/x"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_international_characters() {
        let page = "http://international.com";
        assert_eq!(absolute("españa.asp", page), "http://international.com/espa%C3%B1a.asp");
        assert_eq!(absolute("/faqs#camión", page), "http://international.com/faqs#cami%C3%B3n");
        assert_eq!(
            absolute("/search?q=españa#top", page),
            "http://international.com/search?q=espa%C3%B1a#top"
        );
        assert_eq!(
            absolute("http://example.com/romanée", page),
            "http://example.com/roman%C3%A9e"
        );
    }

    #[test]
    fn test_already_encoded_is_idempotent() {
        let link = "http://international.com/index.php?q=espa%C3%B1a&url=aHR0zZQ==&cntnt01pageid=21";
        assert_eq!(absolute(link, "http://international.com"), link);
        let again = absolute(&absolute(link, "http://a.com"), "http://a.com");
        assert_eq!(again, link);
    }

    #[test]
    fn test_host_casing_kept_scheme_lowered() {
        let url = absolute("HTTP://Example.COM/Path", "http://a.com");
        assert_eq!(url, "http://Example.COM/Path");
    }

    #[test]
    fn test_same_host_ignores_case() {
        let a = ResolvedUrl::parse("http://Example.com/x").unwrap();
        let b = ResolvedUrl::parse("https://example.COM:8080/").unwrap();
        let c = ResolvedUrl::parse("http://www.example.com/").unwrap();
        assert!(a.same_host(&b));
        assert!(!a.same_host(&c));
    }

    #[test]
    fn test_port_and_userinfo() {
        assert_eq!(
            absolute("http://user:pw@example.com:8080/a", "http://a.com"),
            "http://user:pw@example.com:8080/a"
        );
        assert_eq!(absolute("http://example.com:/a", "http://a.com"), "http://example.com/a");
        assert_eq!(absolute("/b", "http://example.com:8080/a"), "http://example.com:8080/b");
        assert_eq!(absolute("http://[::1]:3000/", "http://a.com"), "http://[::1]:3000/");
    }

    #[test]
    fn test_idn_host_written_as_punycode() {
        let url = absolute("http://españa.com/", "http://a.com");
        assert_eq!(url, "http://xn--espaa-rta.com/");
    }

    #[test]
    fn test_opaque_schemes() {
        let ctx = base("http://example.com");
        for link in [
            "mailto:hello@example.com",
            "javascript:alert('hi');",
            "ftp://ftp.example.com/",
            "skype:joeuser?call",
            "telnet://telnet.cdrom.com",
            "javascript://",
            "Tel:+1-555",
        ] {
            assert_eq!(resolve(link, &ctx), ResolveOutcome::Opaque(link.to_string()));
        }
    }

    #[test]
    fn test_opaque_whitespace_encoded() {
        let ctx = base("http://example.com");
        assert_eq!(
            resolve("  mailto:a b@example.com\n", &ctx),
            ResolveOutcome::Opaque("mailto:a%20b@example.com".to_string())
        );
    }

    #[test]
    fn test_unresolvable_inputs() {
        let ctx = base("http://example.com");
        for link in [
            "",
            "   ",
            "http://",
            "http:///path",
            "https:example.com",
            "http://exa mple.com/",
            "http://example.com:80a/",
            "http://[::1/",
            "<p>ftp://ftp.cdrom.com",
            "<b>faqs</b>",
            "/faqs\"",
            ":nothing",
            "1abc:def",
        ] {
            assert!(
                matches!(resolve(link, &ctx), ResolveOutcome::Unresolvable(_)),
                "expected {:?} to be unresolvable",
                link
            );
        }
    }

    #[test]
    fn test_colon_after_slash_is_relative() {
        assert_eq!(absolute("./a:b", "http://x.com/"), "http://x.com/a:b");
        assert_eq!(absolute("/wiki/File:X.png", "http://x.com/"), "http://x.com/wiki/File:X.png");
    }
}

// src/links/encode.rs
// =============================================================================
// Percent-encoding normalization.
//
// Every byte a URL component may not carry literally is replaced by %XX of
// its UTF-8 bytes. Escapes that are already valid (%C3%B1) are left alone, so
// running a string through normalize() twice gives the same result.
//
// Allowed sets follow RFC 3986:
//   unreserved  = ALPHA / DIGIT / "-" / "." / "_" / "~"
//   sub-delims  = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="
//   pchar       = unreserved / sub-delims / ":" / "@"
// =============================================================================

use std::borrow::Cow;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

// Which part of a URL a string belongs to
//
// The component decides which characters are structural (and must stay as
// they are) and which need escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// user:password before the '@'
    Userinfo,
    /// Path, '/' is structural
    Path,
    /// Query, '/' and '?' are allowed, '&' and '=' are sub-delims
    Query,
    /// Fragment, same set as the query
    Fragment,
    /// Whole non-web link (mailto:, javascript:, ...)
    ///
    /// Only whitespace, control bytes, non-ASCII and characters that are
    /// never legal in a URI get escaped.
    Opaque,
}

impl Component {
    fn allows(self, b: u8) -> bool {
        match self {
            Component::Userinfo => is_unreserved(b) || is_sub_delim(b) || b == b':',
            Component::Path => is_pchar(b) || b == b'/',
            Component::Query | Component::Fragment => is_pchar(b) || b == b'/' || b == b'?',
            Component::Opaque => {
                b.is_ascii_graphic()
                    && !matches!(
                        b,
                        b'"' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}'
                    )
            }
        }
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn is_sub_delim(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
    )
}

fn is_pchar(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || b == b':' || b == b'@'
}

// True when bytes[i] is '%' followed by two hex digits
fn is_escape(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'%'
        && bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
        && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
}

fn push_escaped(out: &mut String, b: u8) {
    out.push('%');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0F) as usize] as char);
}

// Re-encodes one URL component
//
// Examples (Path):
//   "/españa.asp"   -> "/espa%C3%B1a.asp"
//   "/espa%C3%B1a"  -> "/espa%C3%B1a"   (already encoded, untouched)
//   "/100%"         -> "/100%25"        (stray '%')
pub fn normalize(input: &str, component: Component) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    // Walk the bytes, not the chars: non-ASCII characters are escaped one
    // UTF-8 byte at a time
    while i < bytes.len() {
        let b = bytes[i];

        // Keep valid escapes as they are, so encoding twice changes nothing
        if b == b'%' && is_escape(bytes, i) {
            // Three ASCII bytes, so the slice sits on char boundaries
            out.push_str(&input[i..i + 3]);
            i += 3;
            continue;
        }
        // Structural and safe characters stay, everything else becomes %XX
        if b != b'%' && component.allows(b) {
            out.push(b as char);
        } else {
            push_escaped(&mut out, b);
        }
        i += 1;
    }

    out
}

// Turns raw attribute bytes into a string without losing anything
//
// Valid UTF-8 passes through unchanged. Bytes that are not valid UTF-8 are
// written as %XX escapes instead of being replaced with U+FFFD, so the
// original bytes can still be recovered from the link.
pub fn lossless_utf8(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(bytes.len() + 8);
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad_len = e.error_len().unwrap_or(after.len());
                for &b in &after[..bad_len] {
                    push_escaped(&mut out, b);
                }
                rest = &after[bad_len..];
            }
        }
    }

    Cow::Owned(out)
}

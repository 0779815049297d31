// src/package/escape.rs

//! Reversible escaping of arbitrary strings into file-name-safe tokens
//!
//! Only the characters that are invalid in file names on common hosts, plus
//! the `%` escape signal itself, are rewritten as `%XX`. Everything else,
//! including `+` and `-` in version strings, passes through untouched.

/// Characters rewritten by [`escape`]
pub const RESERVED: [char; 9] = ['%', '<', '>', ':', '"', '/', '\\', '|', '?'];

/// Escape every reserved character as `%` followed by two uppercase hex digits
///
/// # Examples
///
/// ```
/// use outpost::package::escape::escape;
///
/// assert_eq!(escape("Acme/Web"), "Acme%2FWeb");
/// assert_eq!(escape("1.0.1+beta"), "1.0.1+beta");
/// assert_eq!(escape("100%"), "100%25");
/// ```
pub fn escape(input: &str) -> String {
    escape_with(input, &[])
}

/// Escape the reserved set plus any additional characters
pub(crate) fn escape_with(input: &str, extra: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if RESERVED.contains(&ch) || extra.contains(&ch) {
            out.push_str(&format!("%{:02X}", ch as u32));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Decode `%XX` sequences back into characters
///
/// Decoding is lenient: a `%` that is not followed by two hex digits, or whose
/// code is outside ASCII, is kept as literal text. Decoded output is never
/// re-scanned, so `%2541` decodes to `%41`.
///
/// # Examples
///
/// ```
/// use outpost::package::escape::unescape;
///
/// assert_eq!(unescape("Acme%2FWeb"), "Acme/Web");
/// assert_eq!(unescape("50%zz"), "50%zz");
/// ```
pub fn unescape(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(decoded) = bytes.get(i + 1..i + 3).and_then(decode_pair)
        {
            out.push(decoded);
            i += 3;
            continue;
        }

        // `i` always sits on a char boundary: only ASCII bytes are consumed above
        let ch = input[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

fn decode_pair(pair: &[u8]) -> Option<char> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(pair).ok()?;
    let value = u8::from_str_radix(text, 16).ok()?;
    value.is_ascii().then_some(value as char)
}

//! Title decoding, URL encoding, and capitalization policy.
//!
//! `decode` undoes the encodings a title may arrive in from chat text
//! (underscores, percent escapes, HTML entities); `encode` produces the
//! URL-safe form used in rendered links. `encode(decode(x)) == encode(x)`
//! holds for any input.

/// Characters that break Discord Markdown or MediaWiki URLs when left raw.
/// Everything else, non-ASCII included, stays as written.
const TITLE_ENCODE_SET: &[char] = &[
    '&', '+', '=', '?', '\\', '^', '`', '~', '<', '>', '(', ')',
];

/// Decodes a raw title into its display form.
pub fn decode(title: &str) -> String {
    let mut text = title.trim();
    if let Some(stripped) = text.strip_prefix(':') {
        text = stripped.trim_start();
    }

    let mut text = text.replace('_', " ");
    while text.contains("  ") {
        text = text.replace("  ", " ");
    }
    // Escaped-backslash artifact from Markdown un-escaping.
    if text.contains("\\\\") {
        text = text.replace("\\\\", "");
    }
    if text.contains('&') {
        text = html_escape::decode_html_entities(&text).into_owned();
    }
    if text.contains('%') {
        if let Ok(decoded) = percent_encoding::percent_decode_str(&text).decode_utf8() {
            text = decoded.into_owned();
        }
    }
    // Soft hyphen and directional marks are invisible in titles.
    text = text.replace(['\u{00AD}', '\u{200E}', '\u{200F}'], "");
    text.trim().to_owned()
}

/// Encodes a decoded title for use inside a URL pattern.
pub fn encode(title: &str) -> String {
    let decoded = decode(title);
    let underscored = decoded.split_whitespace().collect::<Vec<_>>().join("_");
    let mut out = String::with_capacity(underscored.len());
    for c in underscored.chars() {
        if TITLE_ENCODE_SET.contains(&c) || c.is_ascii_control() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Uppercases the first code point of a title. Georgian has no case
/// distinction, so Georgian first letters are left alone.
pub fn capitalise(title: &str, should_capitalise: bool) -> String {
    if !should_capitalise || title.is_empty() {
        return title.to_owned();
    }
    let mut chars = title.chars();
    match chars.next() {
        None => String::new(),
        Some(first) if is_georgian(first) => title.to_owned(),
        Some(first) => {
            let mut result = String::with_capacity(title.len());
            result.extend(first.to_uppercase());
            result.extend(chars);
            result
        }
    }
}

fn is_georgian(c: char) -> bool {
    matches!(c,
        '\u{10A0}'..='\u{10FF}' | '\u{1C90}'..='\u{1CBF}' | '\u{2D00}'..='\u{2D2F}')
}

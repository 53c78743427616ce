//! Percent-escaping of the characters that delimit the url form.

use std::borrow::Cow;

/// Characters with structural meaning in `<ids>;<key>=<v,..>?<k>=<v>&..`.
const RESERVED: &[u8] = b"%?&;,=<>#";

/// Escape delimiter characters in one url component.
#[must_use]
pub fn escape(component: &str) -> Cow<'_, str> {
    if !component.bytes().any(|b| RESERVED.contains(&b)) {
        return Cow::Borrowed(component);
    }
    let mut out = String::with_capacity(component.len() + 8);
    for ch in component.chars() {
        match u8::try_from(ch) {
            Ok(b) if RESERVED.contains(&b) => out.push_str(&format!("%{b:02X}")),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Escape a comma-joined id list, also escaping a leading `-` so the list is
/// not read as "no ids".
#[must_use]
pub fn escape_ids(joined: String) -> String {
    match joined.strip_prefix('-') {
        Some(rest) => format!("%2D{rest}"),
        None => joined,
    }
}

/// Decode `%XX` sequences; malformed sequences are kept verbatim.
#[must_use]
pub fn unescape(component: &str) -> Cow<'_, str> {
    if !component.contains('%') {
        return Cow::Borrowed(component);
    }
    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3).and_then(|h| std::str::from_utf8(h).ok());
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(out) {
        Ok(s) => Cow::Owned(s),
        Err(_) => Cow::Borrowed(component),
    }
}

//! String literal escape decoding
//!
//! Turns the raw text between a string literal's quotes into the characters it
//! denotes. Decoding is a single left-to-right pass; every backslash either
//! starts a recognised escape or is copied through verbatim together with the
//! character that follows it.
//!
//! # Recognised escapes
//!
//! | Escape | Result |
//! |--------|--------|
//! | `\n` `\t` `\r` | newline, tab, carriage return |
//! | `\\` `\"` `\'` | backslash, double quote, single quote |
//! | `\0` | NUL |
//! | `\b` `\f` `\v` | backspace, form feed, vertical tab |
//! | `\xHH` | code point from exactly two hex digits |
//! | `\uHHHH` | code point from exactly four hex digits |
//!
//! ```rust
//! use precedent::engine::escape::decode_escapes;
//!
//! assert_eq!(decode_escapes(r"a\tb\nc"), "a\tb\nc");
//! assert_eq!(decode_escapes(r"\x4"), r"\x4");
//! ```

/// Decode the escape sequences in `raw`.
///
/// Unrecognised or incomplete escapes (`\q`, `\1`, `\x4`, `\u12`) are kept
/// exactly as written, backslash included. A lone trailing backslash is kept.
pub fn decode_escapes(raw: &str) -> String {
    // Fast path: nothing to decode
    if memchr::memchr(b'\\', raw.as_bytes()).is_none() {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '0' => out.push('\0'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            'x' | 'u' => {
                let digits = if next == 'x' { 2 } else { 4 };
                match hex_code_point(chars.as_str(), digits) {
                    Some(decoded) => {
                        out.push(decoded);
                        // Hex digits are ASCII, one char each
                        for _ in 0..digits {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Read exactly `digits` hex digits from the front of `rest` as a code point.
fn hex_code_point(rest: &str, digits: usize) -> Option<char> {
    let hex = rest.get(..digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(decode_escapes(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(decode_escapes(r"\r\0"), "\r\0");
        assert_eq!(decode_escapes(r#"\"quoted\""#), "\"quoted\"");
        assert_eq!(decode_escapes(r"it\'s"), "it's");
        assert_eq!(decode_escapes(r"\b\f\v"), "\u{8}\u{c}\u{b}");
    }

    #[test]
    fn test_no_escapes_is_identity() {
        assert_eq!(decode_escapes("plain text"), "plain text");
        assert_eq!(decode_escapes(""), "");
    }

    #[test]
    fn test_hex_escape() {
        assert_eq!(decode_escapes(r"\x41\x62"), "Ab");
        assert_eq!(decode_escapes(r"\x4"), r"\x4");
        assert_eq!(decode_escapes(r"\x4g"), r"\x4g");
        assert_eq!(decode_escapes(r"\x"), r"\x");
    }

    #[test]
    fn test_unicode_escape() {
        assert_eq!(decode_escapes(r"\u0041"), "A");
        assert_eq!(decode_escapes(r"\u00e9\u00E9"), "éé");
        assert_eq!(decode_escapes(r"\u12"), r"\u12");
        assert_eq!(decode_escapes(r"\u004"), r"\u004");
        // Only four digits are consumed
        assert_eq!(decode_escapes(r"\u00411"), "A1");
    }

    #[test]
    fn test_surrogate_is_kept_verbatim() {
        assert_eq!(decode_escapes(r"\uD800"), r"\uD800");
    }

    #[test]
    fn test_unknown_escapes_pass_through() {
        assert_eq!(decode_escapes(r"\q"), r"\q");
        assert_eq!(decode_escapes(r"\1"), r"\1");
        assert_eq!(decode_escapes(r"\é"), r"\é");
    }

    #[test]
    fn test_backslash_runs() {
        assert_eq!(decode_escapes(r"\\\\"), r"\\");
        assert_eq!(decode_escapes(r"\\\n"), "\\\n");
        assert_eq!(decode_escapes(r"\\n"), r"\n");
    }

    #[test]
    fn test_trailing_backslash() {
        assert_eq!(decode_escapes("abc\\"), "abc\\");
        assert_eq!(decode_escapes(r"\\\"), "\\\\");
    }
}

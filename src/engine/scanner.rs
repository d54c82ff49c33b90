//! Token scanners
//!
//! Terminal matchers used by the parser: whitespace, numbers, identifiers,
//! keywords, quoted strings and constant tokens. All scanners take the input
//! and a byte offset and report the end offset of the match; none of them
//! skip leading whitespace.
//!
//! The number and identifier shapes are regexes compiled once per process.

use memchr::memchr2;
use regex::Regex;
use std::sync::OnceLock;

const NUMBER_PATTERN: &str = r"^[0-9]+(?:\.[0-9]+)?";
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_$][A-Za-z0-9_$]*";

static NUMBER_RE: OnceLock<Option<Regex>> = OnceLock::new();
static IDENTIFIER_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn number_re() -> Option<&'static Regex> {
    NUMBER_RE.get_or_init(|| Regex::new(NUMBER_PATTERN).ok()).as_ref()
}

fn identifier_re() -> Option<&'static Regex> {
    IDENTIFIER_RE
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).ok())
        .as_ref()
}

/// Keyword literals recognised in place of identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// `undefined`
    Undefined,
}

impl Keyword {
    /// Keyword for a whole identifier token, if it is one
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "null" => Some(Keyword::Null),
            "true" => Some(Keyword::True),
            "false" => Some(Keyword::False),
            "undefined" => Some(Keyword::Undefined),
            _ => None,
        }
    }
}

/// Whether `c` may continue an identifier
#[inline]
pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Offset of the first non-whitespace character at or after `pos`
#[inline]
pub fn skip_whitespace(input: &str, pos: usize) -> usize {
    match input.get(pos..) {
        Some(rest) => input.len() - rest.trim_start_matches(char::is_whitespace).len(),
        None => input.len(),
    }
}

/// Longest decimal literal at `pos`: digits with an optional fraction
pub fn scan_number(input: &str, pos: usize) -> Option<usize> {
    let rest = input.get(pos..)?;
    number_re()?.find(rest).map(|m| pos + m.end())
}

/// Identifier token at `pos`
pub fn scan_identifier(input: &str, pos: usize) -> Option<usize> {
    let rest = input.get(pos..)?;
    identifier_re()?.find(rest).map(|m| pos + m.end())
}

/// Exact token at `pos`
///
/// A token ending in an identifier character only matches when it is not
/// followed by another identifier character, so `in` does not match the
/// start of `index`.
pub fn match_token(input: &str, pos: usize, token: &str) -> Option<usize> {
    let rest = input.get(pos..)?;
    if !rest.starts_with(token) {
        return None;
    }
    let end = pos + token.len();

    let word_like = token.chars().next_back().is_some_and(is_ident_char);
    if word_like && input[end..].chars().next().is_some_and(is_ident_char) {
        return None;
    }
    Some(end)
}

/// Outcome of scanning for a string literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringScan {
    /// No accepted opening quote at the position
    NoQuote,
    /// A complete literal: `end` is past the closing quote; the raw content
    /// (escapes undecoded) is `input[content_start..content_end]`
    Closed {
        /// Offset just after the opening quote
        content_start: usize,
        /// Offset of the closing quote
        content_end: usize,
        /// Offset just after the closing quote
        end: usize,
    },
    /// The literal runs off the end of the input
    Unterminated,
}

/// String literal at `pos` opened by one of `quotes`
///
/// The literal ends at the first unescaped occurrence of the opening quote.
pub fn scan_string(input: &str, pos: usize, quotes: &[char]) -> StringScan {
    let Some(quote) = input.get(pos..).and_then(|rest| rest.chars().next()) else {
        return StringScan::NoQuote;
    };
    if !quotes.contains(&quote) {
        return StringScan::NoQuote;
    }

    let content_start = pos + quote.len_utf8();
    let closing = if quote.is_ascii() {
        find_closing_ascii(input.as_bytes(), content_start, quote as u8)
    } else {
        find_closing(input, content_start, quote)
    };

    match closing {
        Some(content_end) => StringScan::Closed {
            content_start,
            content_end,
            end: content_end + quote.len_utf8(),
        },
        None => StringScan::Unterminated,
    }
}

fn find_closing_ascii(bytes: &[u8], mut pos: usize, quote: u8) -> Option<usize> {
    while pos < bytes.len() {
        let found = pos + memchr2(quote, b'\\', &bytes[pos..])?;
        if bytes[found] == quote {
            return Some(found);
        }
        // Skip the backslash and the byte it escapes; continuation bytes
        // never equal an ASCII quote so landing mid-character is harmless
        pos = found + 2;
    }
    None
}

fn find_closing(input: &str, pos: usize, quote: char) -> Option<usize> {
    let mut chars = input[pos..].char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(pos + i);
        }
    }
    None
}

/// Short description of what sits at `pos`, for error messages
pub fn describe_at(input: &str, pos: usize) -> String {
    match input.get(pos..).and_then(|rest| rest.chars().next()) {
        None => "end of input".to_string(),
        Some(c) => match scan_identifier(input, pos).or_else(|| scan_number(input, pos)) {
            Some(end) => format!("'{}'", &input[pos..end]),
            None => format!("'{}'", c),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_whitespace() {
        assert_eq!(skip_whitespace("  \t\n1", 0), 4);
        assert_eq!(skip_whitespace("1 ", 1), 2);
        assert_eq!(skip_whitespace("1", 5), 1);
        assert_eq!(skip_whitespace("a\u{00a0}b", 1), 3);
    }

    #[test]
    fn test_scan_number() {
        assert_eq!(scan_number("123+4", 0), Some(3));
        assert_eq!(scan_number("1.5x", 0), Some(3));
        assert_eq!(scan_number("1.", 0), Some(1));
        assert_eq!(scan_number("x1", 0), None);
        assert_eq!(scan_number("x12", 1), Some(3));
    }

    #[test]
    fn test_scan_identifier() {
        assert_eq!(scan_identifier("$foo_1 + 2", 0), Some(6));
        assert_eq!(scan_identifier("1abc", 0), None);
        assert_eq!(Keyword::from_word("true"), Some(Keyword::True));
        assert_eq!(Keyword::from_word("trueish"), None);
    }

    #[test]
    fn test_match_token_word_boundary() {
        assert_eq!(match_token("in x", 0, "in"), Some(2));
        assert_eq!(match_token("index", 0, "in"), None);
        assert_eq!(match_token("in(x)", 0, "in"), Some(2));
        assert_eq!(match_token("++x", 0, "+"), Some(1));
        assert_eq!(match_token("a", 0, "ab"), None);
    }

    #[test]
    fn test_scan_string() {
        let input = r#"'it\'s' + "x""#;
        assert_eq!(
            scan_string(input, 0, &['"', '\'']),
            StringScan::Closed {
                content_start: 1,
                content_end: 6,
                end: 7
            }
        );
        assert_eq!(scan_string(input, 0, &['"']), StringScan::NoQuote);
        assert_eq!(scan_string(r#""abc"#, 0, &['"']), StringScan::Unterminated);
        assert_eq!(scan_string(r#""ab\""#, 0, &['"']), StringScan::Unterminated);
        assert_eq!(
            scan_string(r#""a\\""#, 0, &['"']),
            StringScan::Closed {
                content_start: 1,
                content_end: 4,
                end: 5
            }
        );
    }

    #[test]
    fn test_scan_string_non_ascii_quote() {
        let input = "«é\\««";
        match scan_string(input, 0, &['«', '»']) {
            StringScan::Closed { end, .. } => assert_eq!(end, input.len()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_describe_at() {
        assert_eq!(describe_at("1 + ", 4), "end of input");
        assert_eq!(describe_at("1 + foo", 4), "'foo'");
        assert_eq!(describe_at("1 ) 2", 2), "')'");
    }
}

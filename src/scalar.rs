use alloc::string::String;
use core::iter::Peekable;
use core::str::CharIndices;

use unicode_xid::UnicodeXID;

use crate::error::{at, Diagnostics};
use crate::macros::is_hex;
use crate::ErrorCode;

/// Check if `ch` may start an ECMAScript identifier.
pub fn is_identifier_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_xid_start()
}

/// Check if `ch` may continue an ECMAScript identifier.
pub fn is_identifier_part(ch: char) -> bool {
    ch == '$' || ch == '\u{200c}' || ch == '\u{200d}' || ch.is_xid_continue()
}

/// Check if `text` is a complete identifier name, such as `foo`, `$x` or
/// `null`.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_identifier_start) && chars.all(is_identifier_part)
}

/// Decode a quoted scalar, including its quotes.
///
/// Problems are reported to `diags` at `offset` plus their position in
/// `source`; decoding always continues.
pub(crate) fn quoted_value(source: &str, offset: usize, diags: &mut Diagnostics) -> String {
    let mut chars = source.char_indices().peekable();
    let Some((_, quote)) = chars.next() else {
        return String::new();
    };
    let mut value = String::with_capacity(source.len());
    let mut closed = false;
    while let Some((i, ch)) = chars.next() {
        match ch {
            _ if ch == quote => {
                closed = true;
                break;
            }
            '\r' | '\n' => {
                diags.error(at(offset + i), ErrorCode::BadDqEscape, "Unescaped newline");
                value.push(ch);
                if ch == '\r' {
                    if let Some((_, lf)) = chars.next_if(|&(_, ch)| ch == '\n') {
                        value.push(lf);
                    }
                }
            }
            '\\' => {
                let Some((j, escaped)) = chars.next() else {
                    break;
                };
                match escaped {
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    '\r' => {
                        chars.next_if(|&(_, ch)| ch == '\n');
                    }
                    'x' => hex_escape(source, offset, j, &mut chars, &mut value, diags),
                    'u' => unicode_escape(source, offset, j, &mut chars, &mut value, diags),
                    '0' => value.push('\0'),
                    'b' => value.push('\u{08}'),
                    'f' => value.push('\u{0c}'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'v' => value.push('\u{0b}'),
                    '1'..='9' => {
                        diags.error(
                            at(offset + i),
                            ErrorCode::BadDqEscape,
                            format!("Invalid escaped character {escaped}"),
                        );
                        value.push(escaped);
                    }
                    _ => value.push(escaped),
                }
            }
            _ => value.push(ch),
        }
    }
    if !closed {
        diags.error(
            at(offset + source.len()),
            ErrorCode::MissingChar,
            format!("Missing closing {quote}quote"),
        );
    }
    value
}

/// Read `len` hex digits after the escape letter at `letter`.
fn hex_digits(
    source: &str,
    letter: usize,
    len: usize,
    chars: &mut Peekable<CharIndices<'_>>,
) -> Result<u32, String> {
    let start = letter + 1;
    let mut end = start;
    for _ in 0..len {
        match chars.next_if(|&(_, ch)| is_hex(ch)) {
            Some((i, ch)) => end = i + ch.len_utf8(),
            None => break,
        }
    }
    let digits = &source[start..end];
    if digits.len() == len {
        u32::from_str_radix(digits, 16).map_err(|_| String::from(&source[letter - 1..end]))
    } else {
        Err(String::from(&source[letter - 1..end]))
    }
}

fn hex_escape(
    source: &str,
    offset: usize,
    letter: usize,
    chars: &mut Peekable<CharIndices<'_>>,
    value: &mut String,
    diags: &mut Diagnostics,
) {
    match hex_digits(source, letter, 2, chars) {
        Ok(code) => value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
        Err(raw) => invalid_escape(&raw, offset + letter - 1, value, diags),
    }
}

/// `\uXXXX`, combining UTF-16 surrogate pairs written as two escapes.
fn unicode_escape(
    source: &str,
    offset: usize,
    letter: usize,
    chars: &mut Peekable<CharIndices<'_>>,
    value: &mut String,
    diags: &mut Diagnostics,
) {
    let high = match hex_digits(source, letter, 4, chars) {
        Ok(code) => code,
        Err(raw) => return invalid_escape(&raw, offset + letter - 1, value, diags),
    };
    if !(0xd800..0xdc00).contains(&high) {
        match char::from_u32(high) {
            Some(ch) => value.push(ch),
            None => lone_surrogate(offset + letter - 1, value, diags),
        }
        return;
    }
    let rest = chars.peek().map_or("", |&(i, _)| &source[i..]);
    if rest.starts_with("\\u") {
        let mut lookahead = chars.clone();
        lookahead.next();
        if let Some((low_letter, _)) = lookahead.next() {
            if let Ok(low) = hex_digits(source, low_letter, 4, &mut lookahead) {
                if (0xdc00..0xe000).contains(&low) {
                    *chars = lookahead;
                    let code = 0x10000 + ((high - 0xd800) << 10) + (low - 0xdc00);
                    match char::from_u32(code) {
                        Some(ch) => value.push(ch),
                        None => lone_surrogate(offset + letter - 1, value, diags),
                    }
                    return;
                }
            }
        }
    }
    lone_surrogate(offset + letter - 1, value, diags);
}

fn invalid_escape(raw: &str, offset: usize, value: &mut String, diags: &mut Diagnostics) {
    diags.error(
        at(offset),
        ErrorCode::BadDqEscape,
        format!("Invalid escape sequence {raw}"),
    );
    value.push_str(raw);
}

fn lone_surrogate(offset: usize, value: &mut String, diags: &mut Diagnostics) {
    diags.error(
        at(offset),
        ErrorCode::BadDqEscape,
        "Invalid Unicode surrogate in escape sequence",
    );
    value.push(char::REPLACEMENT_CHARACTER);
}

/// Validate and decode an unquoted scalar.
///
/// Numeric-looking scalars are returned as is; their validity is up to the
/// tag that resolves them. Anything else must be an identifier, possibly
/// with `\uXXXX` escapes.
pub(crate) fn plain_value(source: &str, offset: usize, diags: &mut Diagnostics) -> String {
    if source.starts_with(|ch: char| matches!(ch, '-' | '+' | '.' | '0'..='9')) {
        return String::from(source);
    }
    let mut value = String::with_capacity(source.len());
    let mut chars = source.char_indices().peekable();
    while let Some((i, mut ch)) = chars.next() {
        if ch == '\\' && chars.next_if(|&(_, ch)| ch == 'u').is_some() {
            let escaped = hex_digits(source, i + 1, 4, &mut chars)
                .ok()
                .and_then(char::from_u32);
            match escaped {
                Some(decoded) => ch = decoded,
                None => {
                    diags.error(
                        at(offset + i),
                        ErrorCode::BadScalarStart,
                        format!("Invalid escape sequence in identifier {source}"),
                    );
                    continue;
                }
            }
        }
        let valid = if i == 0 {
            is_identifier_start(ch)
        } else {
            is_identifier_part(ch)
        };
        if !valid {
            diags.error(
                at(offset + i),
                ErrorCode::BadScalarStart,
                format!("Invalid character \\u{:04x}", u32::from(ch)),
            );
        }
        value.push(ch);
    }
    value
}

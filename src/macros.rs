/// Emits a `tracing` event at TRACE level when the `tracing` feature is
/// enabled, and nothing otherwise.
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!($($arg)*);
        }
    };
}

/// Check if the character is a line terminator: LF, CR, LS or PS.
pub(crate) fn is_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if the character is inline white space, including the BOM.
pub(crate) fn is_space(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\u{0b}' | '\u{0c}' | ' ' | '\u{a0}' | '\u{feff}'
    )
}

/// Check if the character is one of the flow indicators that always form a
/// token of their own.
pub(crate) fn is_flow_indicator(ch: char) -> bool {
    matches!(ch, '{' | '}' | '[' | ']' | ':' | ',')
}

pub(crate) fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

pub(crate) fn is_hex(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

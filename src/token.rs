use alloc::string::String;
use core::fmt;

use crate::macros::is_space;

/// The kind of a lexical token.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum TokenKind {
    /// A run of inline white space.
    Space,
    /// A single line break: LF, CR, CRLF, LS or PS.
    Newline,
    /// A `//` or `/* */` comment.
    Comment,
    /// A `'single-quoted'` scalar.
    SingleQuotedScalar,
    /// A `"double-quoted"` scalar.
    DoubleQuotedScalar,
    /// Anything else: identifiers, numbers and stray characters.
    Scalar,
    /// `{`
    FlowMapStart,
    /// `}`
    FlowMapEnd,
    /// `:`
    MapValueInd,
    /// `[`
    FlowSeqStart,
    /// `]`
    FlowSeqEnd,
    /// `,`
    Comma,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Space => "space",
            TokenKind::Newline => "newline",
            TokenKind::Comment => "comment",
            TokenKind::SingleQuotedScalar => "single-quoted-scalar",
            TokenKind::DoubleQuotedScalar => "double-quoted-scalar",
            TokenKind::Scalar => "scalar",
            TokenKind::FlowMapStart => "flow-map-start",
            TokenKind::FlowMapEnd => "flow-map-end",
            TokenKind::MapValueInd => "map-value-ind",
            TokenKind::FlowSeqStart => "flow-seq-start",
            TokenKind::FlowSeqEnd => "flow-seq-end",
            TokenKind::Comma => "comma",
        }
    }

    /// Is this one of the three scalar kinds?
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TokenKind::Scalar | TokenKind::SingleQuotedScalar | TokenKind::DoubleQuotedScalar
        )
    }

    /// Is this white space, a comment or a line break?
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Space | TokenKind::Comment | TokenKind::Newline
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a raw token produced by the [`Lexer`](crate::Lexer).
pub fn token_kind(source: &str) -> TokenKind {
    match source {
        "\r" | "\n" | "\r\n" | "\u{2028}" | "\u{2029}" => return TokenKind::Newline,
        "{" => return TokenKind::FlowMapStart,
        "}" => return TokenKind::FlowMapEnd,
        ":" => return TokenKind::MapValueInd,
        "[" => return TokenKind::FlowSeqStart,
        "]" => return TokenKind::FlowSeqEnd,
        "," => return TokenKind::Comma,
        _ => {}
    }
    let mut chars = source.chars();
    match chars.next() {
        Some(ch) if is_space(ch) => TokenKind::Space,
        Some('\'') => TokenKind::SingleQuotedScalar,
        Some('"') => TokenKind::DoubleQuotedScalar,
        Some('/') if matches!(chars.next(), Some('/' | '*')) => TokenKind::Comment,
        _ => TokenKind::Scalar,
    }
}

/// A classified token as it appears in the CST.
#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct SourceToken {
    pub kind: TokenKind,
    /// Byte offset of the token in the complete source.
    pub offset: usize,
    pub source: String,
}

impl SourceToken {
    pub fn new(kind: TokenKind, offset: usize, source: impl Into<String>) -> Self {
        SourceToken {
            kind,
            offset,
            source: source.into(),
        }
    }

    /// The offset just past the end of the token.
    pub fn end(&self) -> usize {
        self.offset + self.source.len()
    }
}

use alloc::string::String;
use core::fmt;
use core::ops::Range;

/// Diagnostic codes.
///
/// The set is closed; [`ErrorCode::as_str`] gives the stable string form.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum ErrorCode {
    /// A token that is not allowed at this point of the grammar.
    UnexpectedToken,
    /// A required character is missing: a separator, a closing bracket, a
    /// closing quote or the end of a block comment.
    MissingChar,
    /// A plain scalar contains a character that cannot appear in it, or a
    /// plain value did not resolve to anything but a string.
    BadScalarStart,
    /// A malformed escape sequence inside a quoted scalar.
    BadDqEscape,
    /// A tag matched but could not produce a value.
    TagResolveFailed,
    /// A map key that is neither a quoted string nor an identifier.
    BadKey,
    /// Collections nested deeper than the configured limit.
    NestingTooDeep,
    /// An internal invariant was violated.
    Impossible,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "UNEXPECTED_TOKEN",
            ErrorCode::MissingChar => "MISSING_CHAR",
            ErrorCode::BadScalarStart => "BAD_SCALAR_START",
            ErrorCode::BadDqEscape => "BAD_DQ_ESCAPE",
            ErrorCode::TagResolveFailed => "TAG_RESOLVE_FAILED",
            ErrorCode::BadKey => "BAD_KEY",
            ErrorCode::NestingTooDeep => "NESTING_TOO_DEEP",
            ErrorCode::Impossible => "IMPOSSIBLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error or warning found while composing a document.
///
/// `range` is a half-open byte range into the complete source text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{code} at {}..{}: {message}", range.start, range.end)]
#[non_exhaustive]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub range: Range<usize>,
}

impl Diagnostic {
    pub fn new(range: Range<usize>, code: ErrorCode, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            range,
        }
    }
}

/// Errors and warnings collected during composition, before they are handed
/// over to a [`Document`](crate::Document).
#[derive(Clone, Debug, Default)]
pub(crate) struct Diagnostics {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn error(&mut self, range: Range<usize>, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(Diagnostic::new(range, code, message));
    }

    pub fn warn(&mut self, range: Range<usize>, code: ErrorCode, message: impl Into<String>) {
        self.warnings.push(Diagnostic::new(range, code, message));
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// The single-character range starting at `offset`.
pub(crate) fn at(offset: usize) -> Range<usize> {
    offset..offset + 1
}

/// Failure of the convenience entry points that expect exactly one clean
/// document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),
    #[error("expected a single document, found {0}")]
    DocumentCount(usize),
}

/// Failure of a [`ScalarTag`](crate::ScalarTag) resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TagError {
    #[error("{0} is out of range")]
    OutOfRange(String),
    #[error("invalid {kind} {text}")]
    Invalid { kind: &'static str, text: String },
}

//! Concrete syntax tree produced by the [`Parser`](crate::Parser).
//!
//! The tree is lossless: every byte of the input belongs to exactly one
//! [`SourceToken`] or node source string, in order.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{ErrorCode, SourceToken, TokenKind};

/// A top-level item of the parsed stream.
#[derive(Clone, PartialEq, Debug)]
#[non_exhaustive]
pub enum CstToken {
    /// A complete document.
    Document(CstDocument),
    /// White space, a comment or a line break outside any document.
    Source(SourceToken),
    /// A token that could not be placed, with a description of the problem.
    Error(ErrorToken),
    /// An explicit document end marker. Never produced by [`Parser`](crate::Parser),
    /// but accepted by the [`Composer`](crate::Composer) from other drivers.
    DocEnd(DocEnd),
}

impl CstToken {
    /// Append the source text covered by this token to `out`.
    pub fn write_source(&self, out: &mut String) {
        match self {
            CstToken::Document(doc) => doc.write_source(out),
            CstToken::Source(token) => out.push_str(&token.source),
            CstToken::Error(error) => out.push_str(&error.source),
            CstToken::DocEnd(doc_end) => {
                out.push_str(&doc_end.source);
                write_tokens(&doc_end.end, out);
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct ErrorToken {
    pub code: ErrorCode,
    pub offset: usize,
    pub source: String,
    pub message: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct DocEnd {
    pub offset: usize,
    pub source: String,
    /// Trailing tokens on the same line.
    pub end: Vec<SourceToken>,
}

impl DocEnd {
    pub fn new(offset: usize, source: impl Into<String>, end: Vec<SourceToken>) -> Self {
        DocEnd {
            offset,
            source: source.into(),
            end,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
#[non_exhaustive]
pub struct CstDocument {
    pub offset: usize,
    /// Tokens before the content.
    pub start: Vec<SourceToken>,
    pub value: Option<FlowNode>,
    /// Tokens after the content.
    pub end: Vec<SourceToken>,
}

impl CstDocument {
    pub fn new(offset: usize) -> Self {
        CstDocument {
            offset,
            ..Default::default()
        }
    }

    pub fn write_source(&self, out: &mut String) {
        write_tokens(&self.start, out);
        if let Some(value) = &self.value {
            value.write_source(out);
        }
        write_tokens(&self.end, out);
    }
}

/// A content node: a scalar or a collection.
#[derive(Clone, PartialEq, Debug)]
pub enum FlowNode {
    Scalar(FlowScalar),
    Collection(FlowCollection),
}

impl FlowNode {
    pub fn offset(&self) -> usize {
        match self {
            FlowNode::Scalar(scalar) => scalar.offset,
            FlowNode::Collection(collection) => collection.offset,
        }
    }

    pub fn end_mut(&mut self) -> &mut Vec<SourceToken> {
        match self {
            FlowNode::Scalar(scalar) => &mut scalar.end,
            FlowNode::Collection(collection) => &mut collection.end,
        }
    }

    pub fn write_source(&self, out: &mut String) {
        match self {
            FlowNode::Scalar(scalar) => {
                out.push_str(&scalar.source);
                write_tokens(&scalar.end, out);
            }
            FlowNode::Collection(collection) => collection.write_source(out),
        }
    }
}

/// The quoting of a [`FlowScalar`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ScalarKind {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

impl ScalarKind {
    pub(crate) fn from_token(kind: TokenKind) -> Option<ScalarKind> {
        match kind {
            TokenKind::Scalar => Some(ScalarKind::Plain),
            TokenKind::SingleQuotedScalar => Some(ScalarKind::SingleQuoted),
            TokenKind::DoubleQuotedScalar => Some(ScalarKind::DoubleQuoted),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct FlowScalar {
    pub kind: ScalarKind,
    pub offset: usize,
    /// The raw source, including any quotes.
    pub source: String,
    /// Trailing white space, comments and stray tokens.
    pub end: Vec<SourceToken>,
}

impl FlowScalar {
    pub fn new(kind: ScalarKind, offset: usize, source: impl Into<String>) -> Self {
        FlowScalar {
            kind,
            offset,
            source: source.into(),
            end: Vec::new(),
        }
    }
}

/// `{ ... }` or `[ ... ]`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum CollectionKind {
    Map,
    Seq,
}

#[derive(Clone, PartialEq, Debug)]
#[non_exhaustive]
pub struct FlowCollection {
    pub offset: usize,
    /// The opening `{` or `[`.
    pub start: SourceToken,
    pub items: Vec<CollectionItem>,
    /// The closing bracket, if any, followed by trailing tokens.
    pub end: Vec<SourceToken>,
}

impl FlowCollection {
    pub fn new(start: SourceToken) -> Self {
        FlowCollection {
            offset: start.offset,
            start,
            items: Vec::new(),
            end: Vec::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        if self.start.kind == TokenKind::FlowSeqStart {
            CollectionKind::Seq
        } else {
            CollectionKind::Map
        }
    }

    pub fn write_source(&self, out: &mut String) {
        out.push_str(&self.start.source);
        for item in &self.items {
            item.write_source(out);
        }
        write_tokens(&self.end, out);
    }
}

/// One entry of a [`FlowCollection`].
///
/// `sep` is `Some` once the item has a key or a `:`; sequence items that
/// hold a plain value have no `sep` after the collection is closed.
#[derive(Clone, PartialEq, Debug, Default)]
#[non_exhaustive]
pub struct CollectionItem {
    /// Commas, white space and comments before the key or value.
    pub start: Vec<SourceToken>,
    pub key: Option<FlowNode>,
    /// Tokens between key and value, including the `:`.
    pub sep: Option<Vec<SourceToken>>,
    pub value: Option<FlowNode>,
}

impl CollectionItem {
    pub fn new(start: Vec<SourceToken>) -> Self {
        CollectionItem {
            start,
            ..Default::default()
        }
    }

    pub(crate) fn with_key(key: Option<FlowNode>, sep: Vec<SourceToken>) -> Self {
        CollectionItem {
            start: Vec::new(),
            key,
            sep: Some(sep),
            value: None,
        }
    }

    pub fn write_source(&self, out: &mut String) {
        write_tokens(&self.start, out);
        if let Some(key) = &self.key {
            key.write_source(out);
        }
        if let Some(sep) = &self.sep {
            write_tokens(sep, out);
        }
        if let Some(value) = &self.value {
            value.write_source(out);
        }
    }
}

fn write_tokens(tokens: &[SourceToken], out: &mut String) {
    for token in tokens {
        out.push_str(&token.source);
    }
}

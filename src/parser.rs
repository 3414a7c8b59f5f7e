use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::cst::{
    CollectionItem, CollectionKind, CstDocument, CstToken, ErrorToken, FlowCollection, FlowNode,
    FlowScalar, ScalarKind,
};
use crate::line_counter::LineCounter;
use crate::{token_kind, ErrorCode, Lexer, SourceToken, TokenKind, DEFAULT_MAX_DEPTH};

/// An open construct on the parser stack.
#[derive(Clone, Debug)]
enum Frame {
    Document(CstDocument),
    Collection(FlowCollection),
    Scalar(FlowScalar),
}

impl Frame {
    fn end_mut(&mut self) -> &mut Vec<SourceToken> {
        match self {
            Frame::Document(doc) => &mut doc.end,
            Frame::Collection(fc) => &mut fc.end,
            Frame::Scalar(fs) => &mut fs.end,
        }
    }
}

/// Builds a [concrete syntax tree](crate::cst) from JSON5 source.
///
/// The parser is a stack machine: each token is dispatched on the kind of
/// construct at the top of the stack, and constructs are popped into their
/// parent when a token arrives that cannot belong to them. Completed
/// documents, as well as white space and comments between them, are emitted
/// as [`CstToken`]s.
///
/// Malformed input never stops the parser. Tokens that cannot be placed are
/// emitted as [`CstToken::Error`] and parsing continues.
///
/// ```
/// # use json5_cst::{CstToken, Parser};
/// let mut parser = Parser::new();
/// let tokens: Vec<CstToken> = parser.parse("[1, 2] // done", false).collect();
/// assert!(matches!(tokens[0], CstToken::Document(_)));
/// ```
#[derive(Clone, Debug)]
pub struct Parser {
    lexer: Lexer,
    stack: Vec<Frame>,
    /// Stream offset of the current token.
    offset: usize,
    kind: TokenKind,
    source: String,
    max_depth: usize,
    depth: usize,
    lines: Option<LineCounter>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// The CST tokens produced by one call to [`Parser::parse`].
pub struct Parse<'p> {
    parser: &'p mut Parser,
    incomplete: bool,
    queue: VecDeque<CstToken>,
    done: bool,
}

impl Iterator for Parse<'_> {
    type Item = CstToken;

    fn next(&mut self) -> Option<CstToken> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                return Some(token);
            }
            if self.done {
                return None;
            }
            match self.parser.lexer.next_token(self.incomplete) {
                Some(raw) => self.parser.advance(&raw.source, &mut self.queue),
                None => {
                    if !self.incomplete {
                        self.parser.finish(&mut self.queue);
                    }
                    self.done = true;
                }
            }
        }
    }
}

impl Parser {
    /// Create a parser.
    pub fn new() -> Parser {
        Parser {
            lexer: Lexer::new(),
            stack: Vec::with_capacity(16),
            offset: 0,
            kind: TokenKind::Space,
            source: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
            lines: None,
        }
    }

    /// Reset the parser state. Configuration is kept.
    pub fn reset(&mut self) {
        let max_depth = self.max_depth;
        let track_lines = self.lines.is_some();
        *self = Self::new();
        self.max_depth = max_depth;
        if track_lines {
            self.track_lines();
        }
    }

    /// Limit how deeply collections may nest.
    ///
    /// An opening bracket beyond the limit is left in the tree as a stray
    /// token, which the composer reports as
    /// [`ErrorCode::NestingTooDeep`](crate::ErrorCode::NestingTooDeep).
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Record the offset of every line start in a [`LineCounter`].
    pub fn track_lines(&mut self) {
        let mut lines = LineCounter::new();
        lines.add_new_line(self.offset);
        self.lines = Some(lines);
    }

    pub fn line_counter(&self) -> Option<&LineCounter> {
        self.lines.as_ref()
    }

    /// Parse `source`, which may be one chunk of a larger input.
    ///
    /// With `incomplete = true`, tokens that may continue into the next
    /// chunk are held back, and open constructs stay on the stack. With
    /// `incomplete = false` the input is complete and every remaining
    /// construct is emitted.
    pub fn parse(&mut self, source: &str, incomplete: bool) -> Parse<'_> {
        self.lexer.lex(source, incomplete);
        Parse {
            parser: self,
            incomplete,
            queue: VecDeque::new(),
            done: false,
        }
    }

    /// Feed one raw token from an external lexer.
    pub fn next(&mut self, source: &str) -> Vec<CstToken> {
        let mut out = VecDeque::new();
        self.advance(source, &mut out);
        out.into()
    }

    /// Pop every construct still open. Call after the last [`Parser::next`].
    pub fn end(&mut self) -> Vec<CstToken> {
        let mut out = VecDeque::new();
        self.finish(&mut out);
        out.into()
    }

    fn advance(&mut self, source: &str, out: &mut VecDeque<CstToken>) {
        self.source.clear();
        self.source.push_str(source);
        self.kind = token_kind(source);
        self.step(out);
        if self.kind == TokenKind::Newline {
            let end = self.offset + source.len();
            if let Some(lines) = &mut self.lines {
                lines.add_new_line(end);
            }
        }
        self.offset += source.len();
    }

    fn finish(&mut self, out: &mut VecDeque<CstToken>) {
        while !self.stack.is_empty() {
            self.pop(out);
        }
    }

    fn source_token(&self) -> SourceToken {
        SourceToken::new(self.kind, self.offset, self.source.as_str())
    }

    fn step(&mut self, out: &mut VecDeque<CstToken>) {
        match self.stack.last() {
            None => self.stream(out),
            Some(Frame::Document(_)) => self.document(out),
            Some(Frame::Scalar(_)) => self.line_end(out),
            Some(Frame::Collection(_)) => self.collection(out),
        }
    }

    fn push(&mut self, frame: Frame) {
        if let Frame::Collection(_) = frame {
            self.depth += 1;
        }
        trace!(depth = self.stack.len() + 1, offset = self.offset, "push");
        self.stack.push(frame);
    }

    fn pop(&mut self, out: &mut VecDeque<CstToken>) {
        let Some(frame) = self.stack.pop() else {
            out.push_back(CstToken::Error(ErrorToken {
                code: ErrorCode::Impossible,
                offset: self.offset,
                source: self.source.clone(),
                message: String::from("Tried to pop an empty stack"),
            }));
            return;
        };
        trace!(depth = self.stack.len(), offset = self.offset, "pop");
        let node = match frame {
            Frame::Collection(mut fc) => {
                self.depth -= 1;
                if fc.kind() == CollectionKind::Seq {
                    fix_flow_seq_items(&mut fc);
                }
                FlowNode::Collection(fc)
            }
            Frame::Scalar(fs) => FlowNode::Scalar(fs),
            Frame::Document(doc) => {
                out.push_back(CstToken::Document(doc));
                return;
            }
        };
        if let Some(Frame::Scalar(_)) = self.stack.last() {
            // A scalar has no children; close it and retry in its parent.
            self.pop(out);
            self.push(match node {
                FlowNode::Collection(fc) => Frame::Collection(fc),
                FlowNode::Scalar(fs) => Frame::Scalar(fs),
            });
            return self.pop(out);
        }
        match self.stack.last_mut() {
            Some(Frame::Document(doc)) => doc.value = Some(node),
            Some(Frame::Collection(fc)) => match open_item(fc) {
                Some(it) => match it.sep {
                    Some(_) => it.value = Some(node),
                    None => {
                        it.key = Some(node);
                        it.sep = Some(Vec::new());
                    }
                },
                None => fc.items.push(CollectionItem::with_key(Some(node), Vec::new())),
            },
            _ => {
                let mut source = String::new();
                node.write_source(&mut source);
                out.push_back(CstToken::Error(ErrorToken {
                    code: ErrorCode::Impossible,
                    offset: node.offset(),
                    source,
                    message: String::from("Node outside of a document"),
                }));
            }
        }
    }

    fn stream(&mut self, out: &mut VecDeque<CstToken>) {
        if self.kind.is_trivia() {
            out.push_back(CstToken::Source(self.source_token()));
        } else {
            self.push(Frame::Document(CstDocument::new(self.offset)));
            self.document(out);
        }
    }

    fn document(&mut self, out: &mut VecDeque<CstToken>) {
        if let Some(Frame::Document(doc)) = self.stack.last() {
            if doc.value.is_some() {
                return self.line_end(out);
            }
        }
        match self.kind {
            kind if kind.is_scalar() => {
                let scalar = self.flow_scalar();
                self.push(Frame::Scalar(scalar));
            }
            TokenKind::FlowMapStart | TokenKind::FlowSeqStart => {
                let collection = FlowCollection::new(self.source_token());
                self.push(Frame::Collection(collection));
            }
            kind => out.push_back(CstToken::Error(ErrorToken {
                code: ErrorCode::UnexpectedToken,
                offset: self.offset,
                source: self.source.clone(),
                message: format!("Unexpected {kind} token in JSON5 document"),
            })),
        }
    }

    fn collection(&mut self, out: &mut VecDeque<CstToken>) {
        let token = self.source_token();
        let kind = self.kind;
        let nested_too_deep = self.depth >= self.max_depth;
        let Some(Frame::Collection(fc)) = self.stack.last_mut() else {
            return;
        };
        if !fc.end.is_empty() {
            return self.line_end(out);
        }
        match kind {
            TokenKind::Comma => match open_item(fc).filter(|it| it.sep.is_none()) {
                Some(it) => it.start.push(token),
                None => fc.items.push(CollectionItem::new(vec![token])),
            },
            TokenKind::MapValueInd => match open_item(fc) {
                Some(it) => match &mut it.sep {
                    Some(sep) => sep.push(token),
                    None => {
                        it.key = None;
                        it.sep = Some(vec![token]);
                    }
                },
                None => fc.items.push(CollectionItem::with_key(None, vec![token])),
            },
            TokenKind::FlowMapStart | TokenKind::FlowSeqStart if !nested_too_deep => {
                self.push(Frame::Collection(FlowCollection::new(token)));
            }
            TokenKind::FlowMapEnd | TokenKind::FlowSeqEnd => fc.end.push(token),
            kind if kind.is_scalar() => {
                let has_key = open_item(fc).is_some_and(|it| it.sep.is_some());
                let scalar = self.flow_scalar();
                if has_key {
                    return self.push(Frame::Scalar(scalar));
                }
                let Some(Frame::Collection(fc)) = self.stack.last_mut() else {
                    return;
                };
                let key = Some(FlowNode::Scalar(scalar));
                match open_item(fc) {
                    Some(it) => {
                        it.key = key;
                        it.sep = Some(Vec::new());
                    }
                    None => fc.items.push(CollectionItem::with_key(key, Vec::new())),
                }
            }
            // White space, comments, line breaks, and brackets past the
            // nesting limit.
            _ => match open_item(fc) {
                Some(it) => match &mut it.sep {
                    Some(sep) => sep.push(token),
                    None => it.start.push(token),
                },
                None => fc.items.push(CollectionItem::new(vec![token])),
            },
        }
    }

    fn flow_scalar(&mut self) -> FlowScalar {
        let kind = ScalarKind::from_token(self.kind).unwrap_or(ScalarKind::Plain);
        if let Some(lines) = &mut self.lines {
            let mut chars = self.source.char_indices().peekable();
            while let Some((index, ch)) = chars.next() {
                let is_line_end = match ch {
                    '\r' => !matches!(chars.peek(), Some((_, '\n'))),
                    '\n' | '\u{2028}' | '\u{2029}' => true,
                    _ => false,
                };
                if is_line_end {
                    lines.add_new_line(self.offset + index + ch.len_utf8());
                }
            }
        }
        FlowScalar::new(kind, self.offset, self.source.as_str())
    }

    fn line_end(&mut self, out: &mut VecDeque<CstToken>) {
        match self.kind {
            TokenKind::Comma
            | TokenKind::FlowMapEnd
            | TokenKind::MapValueInd
            | TokenKind::FlowSeqEnd => {
                self.pop(out);
                self.step(out);
            }
            kind => {
                let token = self.source_token();
                if let Some(top) = self.stack.last_mut() {
                    top.end_mut().push(token);
                }
                if kind == TokenKind::Newline {
                    self.pop(out);
                }
            }
        }
    }
}

/// The last item of `fc`, if it is still waiting for its value.
fn open_item(fc: &mut FlowCollection) -> Option<&mut CollectionItem> {
    fc.items.last_mut().filter(|it| it.value.is_none())
}

/// Items of a closed `[...]` collection that got a key but no `:` are
/// plain sequence values.
fn fix_flow_seq_items(fc: &mut FlowCollection) {
    for it in &mut fc.items {
        let Some(sep) = &it.sep else {
            continue;
        };
        if it.value.is_some() || sep.iter().any(|st| st.kind == TokenKind::MapValueInd) {
            continue;
        }
        let sep = it.sep.take().unwrap_or_default();
        if let Some(key) = it.key.take() {
            it.value = Some(key);
        }
        match &mut it.value {
            Some(value) => value.end_mut().extend(sep),
            None => it.start.extend(sep),
        }
    }
}

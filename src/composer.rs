use alloc::string::String;
use alloc::vec::Vec;
use core::iter::Fuse;

use crate::compose::compose_doc;
use crate::cst::{CstToken, DocEnd, ErrorToken};
use crate::error::{at, Diagnostics};
use crate::resolve::{resolve_comment, resolve_end};
use crate::{ComposeOptions, Diagnostic, Document, ErrorCode, Range, SourceToken, TokenKind};

/// Composes a stream of [`CstToken`]s into [`Document`]s.
///
/// Each document is held back until the next one starts, or until
/// [`Composer::end`], so that comments following it can still be attached.
///
/// ```
/// # use json5_cst::{ComposeOptions, Composer, Parser, Value};
/// let source = "{a: 1}\n// one";
/// let mut parser = Parser::new();
/// let mut composer = Composer::new(ComposeOptions::default());
/// let docs: Vec<_> = composer
///     .compose(parser.parse(source, false), true, source.len())
///     .collect();
/// assert_eq!(docs.len(), 1);
/// assert_eq!(docs[0].comment.as_deref(), Some(" one"));
/// assert_eq!(docs[0].to_value().get("a"), Some(&Value::Int(1)));
/// ```
#[derive(Debug, Default)]
pub struct Composer {
    options: ComposeOptions,
    doc: Option<Document>,
    prelude: Vec<SourceToken>,
    diags: Diagnostics,
}

/// Stream-level state not yet attached to any document.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct StreamInfo {
    /// Comments that would precede the next document.
    pub comment: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// The documents produced by [`Composer::compose`].
pub struct Compose<'c, I> {
    composer: &'c mut Composer,
    tokens: Fuse<I>,
    force_doc: bool,
    end_offset: usize,
    done: bool,
}

impl<I> Iterator for Compose<'_, I>
where
    I: Iterator<Item = CstToken>,
{
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        for token in self.tokens.by_ref() {
            if let Some(doc) = self.composer.next(token) {
                return Some(doc);
            }
        }
        if self.done {
            return None;
        }
        self.done = true;
        self.composer.end(self.force_doc, self.end_offset)
    }
}

impl Composer {
    pub fn new(options: ComposeOptions) -> Composer {
        Composer {
            options,
            ..Composer::default()
        }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Compose all of `tokens`, then call [`Composer::end`].
    ///
    /// With `force_doc`, an empty document is produced for a stream without
    /// any, ending at `end_offset`.
    pub fn compose<I>(
        &mut self,
        tokens: I,
        force_doc: bool,
        end_offset: usize,
    ) -> Compose<'_, I::IntoIter>
    where
        I: IntoIterator<Item = CstToken>,
    {
        Compose {
            composer: self,
            tokens: tokens.into_iter().fuse(),
            force_doc,
            end_offset,
            done: false,
        }
    }

    /// Advance the composer by one CST token. Returns the previous document
    /// once a new one has started.
    pub fn next(&mut self, token: CstToken) -> Option<Document> {
        match token {
            CstToken::Document(cst) => {
                let mut doc = compose_doc(&self.options, &cst, &mut self.diags);
                self.decorate(&mut doc, false);
                trace!(
                    start = doc.range.start,
                    end = doc.range.end,
                    errors = doc.errors.len(),
                    "composed document"
                );
                return self.doc.replace(doc);
            }
            CstToken::Source(token) => match token.kind {
                TokenKind::Comment | TokenKind::Newline => self.prelude.push(token),
                TokenKind::Space => {}
                kind => self.diags.error(
                    crate::resolve::span(&token),
                    ErrorCode::UnexpectedToken,
                    format!("Unexpected {kind} token in stream"),
                ),
            },
            CstToken::Error(error) => self.error_token(error),
            CstToken::DocEnd(doc_end) => self.doc_end(doc_end),
        }
        None
    }

    /// Call at the end of input to get the last document.
    ///
    /// With `force_doc`, a stream that held no document still produces an
    /// empty one, carrying any comments and errors, with range
    /// `0..end_offset`.
    pub fn end(&mut self, force_doc: bool, end_offset: usize) -> Option<Document> {
        if let Some(mut doc) = self.doc.take() {
            self.decorate(&mut doc, true);
            return Some(doc);
        }
        if !force_doc {
            return None;
        }
        let mut doc = Document::new();
        doc.range = Range::new(0, end_offset, end_offset);
        self.decorate(&mut doc, false);
        Some(doc)
    }

    /// Comments and diagnostics that do not belong to a document yet.
    ///
    /// Mostly useful at the end of an input without documents.
    pub fn stream_info(&self) -> StreamInfo {
        let mut diags = self.diags.clone();
        let (comment, _) = parse_prelude(&self.prelude, &mut diags);
        StreamInfo {
            comment,
            errors: diags.errors,
            warnings: diags.warnings,
        }
    }

    fn error_token(&mut self, error: ErrorToken) {
        let (range, message) = if error.source.is_empty() {
            (at(error.offset), error.message)
        } else {
            let quoted = serde_json::Value::String(error.source.clone());
            (
                error.offset..error.offset + error.source.len(),
                format!("{}: {quoted}", error.message),
            )
        };
        let diagnostic = Diagnostic::new(range, error.code, message);
        match &mut self.doc {
            Some(doc) => doc.errors.push(diagnostic),
            None => self.diags.errors.push(diagnostic),
        }
    }

    fn doc_end(&mut self, doc_end: DocEnd) {
        let Some(mut doc) = self.doc.take() else {
            self.diags.error(
                doc_end.offset..doc_end.offset + doc_end.source.len().max(1),
                ErrorCode::UnexpectedToken,
                "Unexpected doc-end without preceding document",
            );
            return;
        };
        let (comment, end) = resolve_end(
            &doc_end.end,
            doc_end.offset + doc_end.source.len(),
            &mut self.diags,
        );
        self.decorate(&mut doc, true);
        if !comment.is_empty() {
            doc.comment = Some(match doc.comment.take() {
                Some(existing) => format!("{existing}\n{comment}"),
                None => comment,
            });
        }
        doc.range.end = end;
        self.doc = Some(doc);
    }

    /// Attach the prelude comment and the pending diagnostics to `doc`.
    fn decorate(&mut self, doc: &mut Document, after_doc: bool) {
        let (comment, at_empty_line) = parse_prelude(&self.prelude, &mut self.diags);
        if !comment.is_empty() {
            let contents = doc.contents;
            if after_doc {
                doc.comment = Some(match doc.comment.take() {
                    Some(existing) => format!("{existing}\n{comment}"),
                    None => comment,
                });
            } else if at_empty_line || contents.is_none() {
                doc.comment_before = Some(comment);
            } else if let Some(node) = contents.and_then(|id| doc.get_node_mut(id)) {
                node.comment_before = Some(match node.comment_before.take() {
                    Some(existing) => format!("{comment}\n{existing}"),
                    None => comment,
                });
            }
        }
        doc.errors.append(&mut self.diags.errors);
        doc.warnings.append(&mut self.diags.warnings);
        self.prelude.clear();
    }
}

/// Join the comments of a prelude. Comment blocks separated by a blank line
/// are joined with an empty line. Also returns whether the prelude ends with
/// a blank line.
fn parse_prelude(prelude: &[SourceToken], diags: &mut Diagnostics) -> (String, bool) {
    let mut comment = String::new();
    let mut at_comment = false;
    let mut at_empty_line = false;
    for token in prelude {
        if token.kind == TokenKind::Comment {
            let text = resolve_comment(token, diags);
            if !comment.is_empty() {
                comment.push_str(if at_empty_line { "\n\n" } else { "\n" });
            }
            comment.push_str(text);
            at_comment = true;
            at_empty_line = false;
        } else {
            if !at_comment {
                at_empty_line = true;
            }
            at_comment = false;
        }
    }
    (comment, at_empty_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeData, Parser, Value};
    use pretty_assertions::assert_eq;

    fn compose(source: &str, force_doc: bool) -> Vec<Document> {
        let mut parser = Parser::new();
        let mut composer = Composer::default();
        composer
            .compose(parser.parse(source, false), force_doc, source.len())
            .collect()
    }

    fn single(source: &str) -> Document {
        let mut docs = compose(source, true);
        assert_eq!(docs.len(), 1, "{source:?}");
        docs.remove(0)
    }

    fn messages(doc: &Document) -> Vec<&str> {
        doc.errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn empty_stream() {
        assert!(compose("", false).is_empty());
        let docs = compose("", true);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].range, Range::new(0, 0, 0));
        assert!(docs[0].contents.is_none());

        let mut composer = Composer::default();
        let doc = composer.end(true, 17);
        assert_eq!(doc.map(|d| d.range.end), Some(17));
    }

    #[test]
    fn comment_only_stream() {
        let mut parser = Parser::new();
        let mut composer = Composer::default();
        for token in parser.parse("// a\n// b\n", false) {
            assert!(composer.next(token).is_none());
        }
        let info = composer.stream_info();
        assert_eq!(info.comment, " a\n b");
        assert!(info.errors.is_empty());

        let doc = composer.end(true, 10);
        assert_eq!(doc.and_then(|d| d.comment_before), Some(String::from(" a\n b")));
    }

    #[test]
    fn prelude_attaches_to_content() {
        let doc = single("// head\n{a: 1}");
        assert_eq!(doc.comment_before, None);
        assert_eq!(
            doc.get_root_node().and_then(|n| n.comment_before.as_deref()),
            Some(" head")
        );

        let doc = single("// one\n\n// two\n\n[1]");
        assert_eq!(doc.comment_before.as_deref(), Some(" one\n\n two"));
    }

    #[test]
    fn trailing_comments() {
        let doc = single("1 // one\n// two\n");
        assert_eq!(doc.get_root_node().and_then(|n| n.comment.as_deref()), Some(" one"));
        assert_eq!(doc.comment.as_deref(), Some(" two"));
        assert_eq!(doc.range, Range::new(0, 9, 16));
    }

    #[test]
    fn same_line_comment_moves_to_previous_pair() {
        let doc = single("{a: 1, // c\n b: 2}");
        assert!(doc.errors.is_empty(), "{:?}", doc.errors);
        let root = doc.contents.unwrap();
        let a = doc.lookup(root, "a").and_then(|id| doc.get_node(id)).unwrap();
        let b = doc.lookup(root, "b").and_then(|id| doc.get_node(id)).unwrap();
        assert_eq!(a.comment.as_deref(), Some(" c"));
        assert_eq!(b.comment_before, None);
        let NodeData::Mapping { pairs, .. } = &doc.get_root_node().unwrap().data else {
            panic!("expected a mapping");
        };
        let b_key = doc.get_node(pairs[1].key).unwrap();
        assert_eq!(b_key.comment_before, None);
    }

    #[test]
    fn own_line_comment_stays_with_next_item() {
        let doc = single("[1,\n// c\n2]");
        let NodeData::Sequence { items, .. } = &doc.get_root_node().unwrap().data else {
            panic!("expected a sequence");
        };
        let two = doc.get_node(items[1]).unwrap();
        assert_eq!(two.comment_before.as_deref(), Some(" c"));
        assert_eq!(doc.get_node(items[0]).unwrap().comment, None);
    }

    #[test]
    fn multiple_documents() {
        let docs = compose("1 2", false);
        assert_eq!(docs.len(), 1);
        assert_eq!(messages(&docs[0]), ["Unexpected scalar at node end"]);

        let docs = compose("[1] ,[2]", false);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].to_value(), Value::Seq(vec![Value::Int(2)]));
        assert_eq!(
            messages(&docs[0]),
            ["Unexpected comma token in JSON5 document: \",\""]
        );
    }

    #[test]
    fn doc_end_tokens() {
        let mut composer = Composer::default();
        assert!(composer
            .next(CstToken::DocEnd(DocEnd::new(0, "", Vec::new())))
            .is_none());
        assert_eq!(
            composer.stream_info().errors[0].message,
            "Unexpected doc-end without preceding document"
        );

        let mut parser = Parser::new();
        for token in parser.parse("1", false) {
            assert!(composer.next(token).is_none());
        }
        let end = vec![
            SourceToken::new(TokenKind::Space, 1, " "),
            SourceToken::new(TokenKind::Comment, 2, "// end"),
        ];
        assert!(composer.next(CstToken::DocEnd(DocEnd::new(1, "", end))).is_none());
        let doc = composer.end(false, 8).unwrap();
        assert_eq!(doc.comment.as_deref(), Some(" end"));
        assert_eq!(doc.range.end, 8);
        assert_eq!(doc.errors.len(), 1);
    }

    #[test]
    fn errors_before_first_document() {
        let docs = compose("] 1", false);
        assert_eq!(docs.len(), 1);
        assert_eq!(
            messages(&docs[0]),
            [
                "Unexpected flow-seq-end token in JSON5 document: \"]\"",
                "Unexpected space token in JSON5 document: \" \"",
            ]
        );
        assert_eq!(docs[0].errors[0].range, 0..1);
        assert_eq!(docs[0].to_value(), Value::Int(1));
    }
}

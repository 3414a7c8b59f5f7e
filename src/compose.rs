use alloc::string::String;

use crate::cst::{CollectionKind, CstDocument, FlowCollection, FlowNode, FlowScalar, ScalarKind};
use crate::error::{at, Diagnostics};
use crate::resolve::{
    comment_text, empty_scalar_position, resolve_end, resolve_props, span, strip_line_break,
    Props, PropsArgs,
};
use crate::scalar::{is_identifier, plain_value, quoted_value};
use crate::{
    ComposeOptions, Document, ErrorCode, Format, NodeData, NodeId, Range, ResolveContext,
    Resolved, Scalar, ScalarStyle, SourceToken, TokenKind, Value, STR_TAG,
};

/// Where a node appears, which decides the checks applied to it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Position {
    Key,
    Value,
}

/// Builds one [`Document`] from its CST.
struct DocumentBuilder<'a> {
    options: &'a ComposeOptions,
    doc: Document,
    diags: &'a mut Diagnostics,
    depth: usize,
    /// Scalars whose tag failed to resolve. That error already covers them.
    unresolved: Vec<NodeId>,
}

/// Compose a CST document. Diagnostics go to `diags`; the caller moves them
/// into the document.
pub(crate) fn compose_doc(
    options: &ComposeOptions,
    cst: &CstDocument,
    diags: &mut Diagnostics,
) -> Document {
    let mut builder = DocumentBuilder {
        options,
        doc: Document::new(),
        diags,
        depth: 0,
        unresolved: Vec::new(),
    };
    let args = PropsArgs {
        flow: "document",
        offset: cst.offset,
        start_on_newline: true,
        expect_map_ind: false,
    };
    let props = resolve_props(&cst.start, args, builder.diags);
    let contents = match &cst.value {
        Some(value) => builder.compose_node(value, &props, Position::Value),
        None => builder.compose_empty_node(props.end, &cst.start, &props),
    };
    let content_end = builder.range(contents).end;
    let (comment, end) = resolve_end(&cst.end, content_end, builder.diags);
    let mut doc = builder.doc;
    doc.contents = Some(contents);
    if !comment.is_empty() {
        doc.comment = Some(comment);
    }
    doc.range = Range::new(cst.offset, content_end, end);
    doc
}

impl DocumentBuilder<'_> {
    fn range(&self, id: NodeId) -> Range {
        self.doc.get_node(id).map(|node| node.range).unwrap_or_default()
    }

    fn compose_node(&mut self, node: &FlowNode, props: &Props<'_>, position: Position) -> NodeId {
        let id = match node {
            FlowNode::Scalar(fs) => self.compose_scalar(fs),
            FlowNode::Collection(fc) if self.depth >= self.options.max_depth => {
                self.diags.error(
                    span(&fc.start),
                    ErrorCode::NestingTooDeep,
                    "Collections are nested too deeply",
                );
                self.compose_scalar(&FlowScalar::new(ScalarKind::Plain, fc.offset, ""))
            }
            FlowNode::Collection(fc) => self.compose_collection(fc),
        };
        match position {
            Position::Key => self.check_key(id),
            Position::Value => self.check_value(id),
        }
        if let Some(node) = self.doc.get_node_mut(id) {
            if props.space_before {
                node.space_before = true;
            }
            if !props.comment.is_empty() {
                let empty = node.as_scalar().is_some_and(|s| s.source.is_empty());
                if empty {
                    node.comment = Some(props.comment.clone());
                } else {
                    node.comment_before = Some(props.comment.clone());
                }
            }
        }
        id
    }

    /// Stand in for a missing node with an empty plain scalar.
    fn compose_empty_node(
        &mut self,
        offset: usize,
        before: &[SourceToken],
        props: &Props<'_>,
    ) -> NodeId {
        let pos = empty_scalar_position(offset, before);
        self.diags
            .error(at(pos), ErrorCode::UnexpectedToken, "Expected a value");
        let id = self.compose_scalar(&FlowScalar::new(ScalarKind::Plain, pos, ""));
        if let Some(node) = self.doc.get_node_mut(id) {
            if props.space_before {
                node.space_before = true;
            }
            if !props.comment.is_empty() {
                node.comment = Some(props.comment.clone());
            }
        }
        id
    }

    /// Keys must be quoted strings or identifiers. Plain keywords such as
    /// `null` are identifiers in key position.
    fn check_key(&mut self, id: NodeId) {
        let Some(node) = self.doc.get_node_mut(id) else {
            return;
        };
        let start = node.range.start;
        let value_end = node.range.value_end;
        if let NodeData::Scalar(scalar) = &mut node.data {
            if scalar.source.is_empty() {
                return;
            }
            let quoted = scalar.style != ScalarStyle::Plain;
            let is_string = matches!(scalar.value, Value::String(_));
            if is_string && (quoted || scalar.format == Some(Format::Identifier)) {
                return;
            }
            if !quoted {
                let name = plain_value(&scalar.source, start, &mut Diagnostics::default());
                if is_identifier(&name) {
                    scalar.value = Value::from(name);
                    scalar.tag = String::from(STR_TAG);
                    scalar.format = Some(Format::Identifier);
                    return;
                }
            }
        }
        self.diags.error(
            start..value_end,
            ErrorCode::BadKey,
            "Map keys must be identifiers or quoted strings",
        );
    }

    /// Plain scalars in value position must be matched by a tag other than
    /// the string fallback. With strict tags this was already reported.
    fn check_value(&mut self, id: NodeId) {
        if self.options.strict_tags || self.unresolved.contains(&id) {
            return;
        }
        let Some(node) = self.doc.get_node(id) else {
            return;
        };
        let Some(scalar) = node.as_scalar() else {
            return;
        };
        if scalar.style == ScalarStyle::Plain
            && !scalar.source.is_empty()
            && scalar.format.is_none()
            && scalar.tag == self.options.tags.fallback().tag()
            && matches!(scalar.value, Value::String(_))
        {
            let message = format!("Invalid plain value {}", scalar.source);
            self.diags.error(
                node.range.start..node.range.value_end,
                ErrorCode::BadScalarStart,
                message,
            );
        }
    }

    fn compose_scalar(&mut self, fs: &FlowScalar) -> NodeId {
        let (text, style) = match fs.kind {
            ScalarKind::Plain => (
                plain_value(&fs.source, fs.offset, self.diags),
                ScalarStyle::Plain,
            ),
            ScalarKind::SingleQuoted => (
                quoted_value(&fs.source, fs.offset, self.diags),
                ScalarStyle::SingleQuoted,
            ),
            ScalarKind::DoubleQuoted => (
                quoted_value(&fs.source, fs.offset, self.diags),
                ScalarStyle::DoubleQuoted,
            ),
        };
        let value_end = fs.offset + fs.source.len();
        let (comment, end) = resolve_end(&fs.end, value_end, self.diags);
        let token_range = if fs.source.is_empty() {
            at(fs.offset)
        } else {
            fs.offset..value_end
        };

        let options = self.options;
        let registry = &options.tags;
        let tag = match style {
            ScalarStyle::Plain => registry.match_plain(&text).unwrap_or_else(|| {
                if options.strict_tags && !fs.source.is_empty() {
                    self.diags.error(
                        token_range.clone(),
                        ErrorCode::TagResolveFailed,
                        format!("No tag matches the plain scalar {}", fs.source),
                    );
                }
                registry.fallback()
            }),
            _ => registry.fallback(),
        };

        let mut ctx = ResolveContext::new(options.int_as_bigint);
        let mut failed = false;
        let mut scalar = match tag.resolve(&text, &mut ctx) {
            Ok(Resolved::Scalar(scalar)) => scalar,
            Ok(Resolved::Value(value)) => {
                let mut scalar = Scalar::new(value, "", tag.tag());
                scalar.format = tag.format();
                scalar
            }
            Err(err) => {
                self.diags.error(
                    token_range.clone(),
                    ErrorCode::TagResolveFailed,
                    err.to_string(),
                );
                failed = true;
                Scalar::new(Value::String(text), "", registry.fallback().tag())
            }
        };
        for message in ctx.errors {
            self.diags
                .error(token_range.clone(), ErrorCode::TagResolveFailed, message);
        }
        for message in ctx.warnings {
            self.diags
                .warn(token_range.clone(), ErrorCode::TagResolveFailed, message);
        }
        scalar.source.clone_from(&fs.source);
        scalar.style = style;

        let id = self
            .doc
            .add_scalar(scalar, Range::new(fs.offset, value_end, end));
        if failed {
            self.unresolved.push(id);
        }
        if !comment.is_empty() {
            if let Some(node) = self.doc.get_node_mut(id) {
                node.comment = Some(comment);
            }
        }
        id
    }

    fn compose_collection(&mut self, fc: &FlowCollection) -> NodeId {
        let is_map = fc.kind() == CollectionKind::Map;
        let name = if is_map { "flow map" } else { "flow sequence" };
        let id = if is_map {
            self.doc.add_mapping(Range::default())
        } else {
            self.doc.add_sequence(Range::default())
        };
        self.depth += 1;

        let mut comment = String::new();
        let mut last = None;
        let mut offset = fc.offset;
        for (i, item) in fc.items.iter().enumerate() {
            let args = PropsArgs {
                flow: name,
                offset,
                start_on_newline: false,
                expect_map_ind: false,
            };
            let mut props = resolve_props(&item.start, args, self.diags);
            if item.sep.is_none() && item.value.is_none() {
                match props.comma {
                    Some(comma) if i == 0 => self.diags.error(
                        span(comma),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected , in {name}"),
                    ),
                    _ if i + 1 < fc.items.len() => self.diags.error(
                        at(props.end),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected empty item in {name}"),
                    ),
                    _ => {}
                }
                append_line(&mut comment, &props.comment);
                continue;
            }
            if i == 0 {
                if let Some(comma) = props.comma {
                    self.diags.error(
                        span(comma),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected , in {name}"),
                    );
                }
            } else {
                if props.comma.is_none() {
                    self.diags.error(
                        at(props.end),
                        ErrorCode::MissingChar,
                        format!("Missing , between {name} items"),
                    );
                }
                if !props.comment.is_empty() {
                    self.move_trailing_comment(&item.start, last, &mut props.comment);
                }
            }

            if !is_map && item.sep.is_none() {
                let value = match &item.value {
                    Some(value) => self.compose_node(value, &props, Position::Value),
                    None => self.compose_empty_node(props.end, &item.start, &props),
                };
                self.doc.append_sequence_item(id, value);
                offset = self.range(value).end;
                last = Some(value);
                continue;
            }

            let key_start = props.end;
            let key = match &item.key {
                Some(key) => self.compose_node(key, &props, Position::Key),
                None => self.compose_empty_node(key_start, &item.start, &props),
            };
            let sep = item.sep.as_deref().unwrap_or_default();
            let args = PropsArgs {
                flow: name,
                offset: self.range(key).end,
                start_on_newline: false,
                expect_map_ind: true,
            };
            let value_props = resolve_props(sep, args, self.diags);
            if item.value.is_some() && value_props.found.is_none() {
                let message = if is_map {
                    "Missing , or : between flow map items"
                } else {
                    "Missing , between flow sequence items"
                };
                self.diags
                    .error(at(value_props.end), ErrorCode::MissingChar, message);
            }
            let value = match &item.value {
                Some(value) => self.compose_node(value, &value_props, Position::Value),
                None => self.compose_empty_node(value_props.end, sep, &value_props),
            };
            let value_range = self.range(value);
            if is_map {
                self.doc.append_mapping_pair(id, key, value);
                last = Some(value);
            } else {
                self.diags.error(
                    key_start..value_range.value_end,
                    ErrorCode::MissingChar,
                    "Missing {} around map in seq",
                );
                let map = self.doc.add_mapping(Range::new(
                    self.range(key).start,
                    value_range.value_end,
                    value_range.end,
                ));
                self.doc.append_mapping_pair(map, key, value);
                self.doc.append_sequence_item(id, map);
                last = Some(map);
            }
            offset = value_range.end;
        }
        self.depth -= 1;

        let (expected, closer) = if is_map {
            (TokenKind::FlowMapEnd, '}')
        } else {
            (TokenKind::FlowSeqEnd, ']')
        };
        let (value_end, rest) = match fc.end.split_first() {
            Some((ce, rest)) if ce.kind == expected => (ce.end(), rest),
            first => {
                self.diags.error(
                    at(offset),
                    ErrorCode::MissingChar,
                    format!("Expected {name} to end with {closer}"),
                );
                match first {
                    // A mismatched bracket is dropped.
                    Some((ce, rest))
                        if matches!(ce.kind, TokenKind::FlowMapEnd | TokenKind::FlowSeqEnd) =>
                    {
                        (offset, rest)
                    }
                    _ => (offset, &fc.end[..]),
                }
            }
        };
        let (end_comment, end) = resolve_end(rest, value_end, self.diags);
        append_line(&mut comment, &end_comment);

        if let Some(node) = self.doc.get_node_mut(id) {
            node.range = Range::new(fc.offset, value_end, end);
            if !comment.is_empty() {
                node.comment = Some(comment);
            }
        }
        id
    }

    /// A comment on the same line as the comma after the previous item
    /// belongs to that item.
    fn move_trailing_comment(
        &mut self,
        start: &[SourceToken],
        prev: Option<NodeId>,
        comment: &mut String,
    ) {
        let first = start
            .iter()
            .find(|st| !matches!(st.kind, TokenKind::Comma | TokenKind::Space));
        let Some(token) = first.filter(|st| st.kind == TokenKind::Comment) else {
            return;
        };
        let Some(prev) = prev.and_then(|id| self.doc.get_node_mut(id)) else {
            return;
        };
        let text = comment_text(token);
        prev.append_comment(text);
        if let Some(rest) = comment.strip_prefix(text) {
            *comment = String::from(strip_line_break(rest));
        }
    }
}

fn append_line(comment: &mut String, line: &str) {
    if line.is_empty() {
        return;
    }
    if !comment.is_empty() {
        comment.push('\n');
    }
    comment.push_str(line);
}

//! Helpers that turn runs of source tokens around a node into comments,
//! flags and positions.

use alloc::string::String;
use core::ops;

use crate::error::{at, Diagnostics};
use crate::{ErrorCode, SourceToken, TokenKind};

/// The byte range covered by `token`.
pub(crate) fn span(token: &SourceToken) -> ops::Range<usize> {
    if token.source.is_empty() {
        at(token.offset)
    } else {
        token.offset..token.end()
    }
}

/// What was found in the tokens before a node.
#[derive(Debug)]
pub(crate) struct Props<'t> {
    pub comma: Option<&'t SourceToken>,
    /// The `:` of a map pair.
    pub found: Option<&'t SourceToken>,
    /// Was the node preceded by a blank line?
    pub space_before: bool,
    pub comment: String,
    /// End offset of the last token, or the starting offset if there were
    /// none.
    pub end: usize,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct PropsArgs<'a> {
    /// Name of the enclosing construct, for messages.
    pub flow: &'a str,
    pub offset: usize,
    pub start_on_newline: bool,
    pub expect_map_ind: bool,
}

pub(crate) fn resolve_props<'t>(
    tokens: &'t [SourceToken],
    args: PropsArgs<'_>,
    diags: &mut Diagnostics,
) -> Props<'t> {
    let mut props = Props {
        comma: None,
        found: None,
        space_before: false,
        comment: String::new(),
        end: tokens.last().map_or(args.offset, SourceToken::end),
    };
    let mut at_newline = args.start_on_newline;
    let mut comment_sep = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Space => {}
            TokenKind::Comment => {
                let text = resolve_comment(token, diags);
                if !props.comment.is_empty() {
                    props.comment.push_str(&comment_sep);
                }
                props.comment.push_str(text);
                comment_sep.clear();
                at_newline = false;
            }
            TokenKind::Newline => {
                if !at_newline {
                    comment_sep.push_str(&token.source);
                } else if props.comment.is_empty() {
                    props.space_before = true;
                } else {
                    props.comment.push_str(&token.source);
                }
                at_newline = true;
            }
            TokenKind::Comma => {
                if props.comma.is_some() {
                    diags.error(
                        span(token),
                        ErrorCode::UnexpectedToken,
                        format!("Unexpected , in {}", args.flow),
                    );
                }
                props.comma = Some(token);
                at_newline = false;
            }
            TokenKind::MapValueInd if args.expect_map_ind => {
                props.found = Some(token);
                at_newline = false;
            }
            TokenKind::FlowMapStart | TokenKind::FlowSeqStart => {
                diags.error(
                    span(token),
                    ErrorCode::NestingTooDeep,
                    "Collections are nested too deeply",
                );
                at_newline = false;
            }
            kind => {
                diags.error(
                    span(token),
                    ErrorCode::UnexpectedToken,
                    format!("Unexpected {kind} token"),
                );
                at_newline = false;
            }
        }
    }
    props
}

/// Collect the comments in the tokens after a node. Returns the comment and
/// the end offset of the node including those tokens.
pub(crate) fn resolve_end(
    tokens: &[SourceToken],
    mut offset: usize,
    diags: &mut Diagnostics,
) -> (String, usize) {
    let mut comment = String::new();
    let mut sep = String::new();
    for token in tokens {
        match token.kind {
            TokenKind::Space => {}
            TokenKind::Comment => {
                let text = resolve_comment(token, diags);
                if !comment.is_empty() {
                    comment.push_str(&sep);
                }
                comment.push_str(text);
                sep.clear();
            }
            TokenKind::Newline => {
                if !comment.is_empty() {
                    sep.push_str(&token.source);
                }
            }
            kind => diags.error(
                span(token),
                ErrorCode::UnexpectedToken,
                format!("Unexpected {kind} at node end"),
            ),
        }
        offset += token.source.len();
    }
    (comment, offset)
}

/// The text of a comment token, reporting an unterminated block comment.
pub(crate) fn resolve_comment<'t>(token: &'t SourceToken, diags: &mut Diagnostics) -> &'t str {
    check_comment_end(token, diags);
    comment_text(token)
}

pub(crate) fn check_comment_end(token: &SourceToken, diags: &mut Diagnostics) {
    let source = &token.source;
    if source.starts_with("/*") && (source.len() < 4 || !source.ends_with("*/")) {
        diags.error(
            span(token),
            ErrorCode::MissingChar,
            "Block comment must end with */",
        );
    }
}

/// The text of a comment token without its delimiters. An empty comment is
/// a single space.
pub(crate) fn comment_text(token: &SourceToken) -> &str {
    let source = token.source.as_str();
    let text = match source.strip_prefix("/*") {
        Some(body) if source.len() >= 4 => body.strip_suffix("*/").unwrap_or(body),
        Some(body) => body,
        None => source.get(2..).unwrap_or_default(),
    };
    if text.is_empty() {
        " "
    } else {
        text
    }
}

/// Where to put an empty scalar that stands in for a missing node, given
/// the tokens `before` it and their end `offset`: after the last token that
/// is not white space, a comment or a line break, and after any spaces that
/// follow it.
pub(crate) fn empty_scalar_position(mut offset: usize, before: &[SourceToken]) -> usize {
    for (i, token) in before.iter().enumerate().rev() {
        if token.kind.is_trivia() {
            offset = offset.saturating_sub(token.source.len());
            continue;
        }
        offset += before[i + 1..]
            .iter()
            .take_while(|st| st.kind == TokenKind::Space)
            .map(|st| st.source.len())
            .sum::<usize>();
        break;
    }
    offset
}

/// Drop one leading line break from `text`.
pub(crate) fn strip_line_break(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix("\r\n") {
        return rest;
    }
    let mut chars = text.chars();
    match chars.next() {
        Some(ch) if crate::macros::is_break(ch) => chars.as_str(),
        _ => text,
    }
}

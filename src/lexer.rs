use alloc::collections::VecDeque;
use alloc::string::String;

use crate::macros::{is_break, is_flow_indicator, is_quote, is_space};

/// The states of the lexer.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum LexerState {
    /// Between tokens, or inside an unquoted identifier.
    #[default]
    Input,
    /// Inside a run of inline white space.
    WhiteSpace,
    /// Inside a `//` comment.
    LineComment,
    /// Inside a `/* */` comment.
    BlockComment,
    /// Inside a single- or double-quoted scalar.
    QuotedScalar,
}

/// A raw lexical token: a slice of the source and its byte offset.
#[derive(Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub struct RawToken {
    /// Byte offset of the token in the complete source.
    pub offset: usize,
    /// The exact source text of the token.
    pub source: String,
}

/// Splits JSON5 source text into raw tokens.
///
/// The lexer does not interpret its tokens beyond finding their boundaries;
/// see [`token_kind`](crate::token_kind) for that. Input may be supplied in
/// chunks: a chunk fed with `incomplete = true` may leave a partial token in
/// the internal buffer, to be completed by the next call.
///
/// ```
/// # use json5_cst::Lexer;
/// let mut lexer = Lexer::new();
/// let tokens: Vec<String> = lexer.lex("{a: 1}", false).map(|t| t.source).collect();
/// assert_eq!(tokens, ["{", "a", ":", " ", "1", "}"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Lexer {
    buffer: String,
    /// Stream offset of `buffer[0]`.
    base: usize,
    /// Start of the current token within `buffer`.
    pos: usize,
    /// Next byte of `buffer` to look at.
    peek: usize,
    state: LexerState,
    queue: VecDeque<RawToken>,
    suspended: bool,
}

/// The tokens produced by one call to [`Lexer::lex`].
pub struct Tokens<'l> {
    lexer: &'l mut Lexer,
    incomplete: bool,
}

impl Iterator for Tokens<'_> {
    type Item = RawToken;

    fn next(&mut self) -> Option<RawToken> {
        self.lexer.next_token(self.incomplete)
    }
}

impl Lexer {
    pub fn new() -> Lexer {
        Lexer::default()
    }

    /// Reset the lexer state, dropping any buffered input.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The current state of the lexer.
    pub fn state(&self) -> LexerState {
        self.state
    }

    /// Feed `source` to the lexer and iterate over the tokens it completes.
    ///
    /// With `incomplete = false` the source is taken to end the input, and
    /// any token still buffered at its end is emitted as is.
    pub fn lex(&mut self, source: &str, incomplete: bool) -> Tokens<'_> {
        self.buffer.push_str(source);
        self.suspended = false;
        Tokens {
            lexer: self,
            incomplete,
        }
    }

    pub(crate) fn next_token(&mut self, incomplete: bool) -> Option<RawToken> {
        loop {
            if let Some(token) = self.queue.pop_front() {
                trace!(offset = token.offset, source = ?token.source, "lex");
                return Some(token);
            }
            if self.suspended {
                if incomplete || self.buffer.is_empty() {
                    return None;
                }
                let source = core::mem::take(&mut self.buffer);
                let offset = self.base;
                self.base += source.len();
                self.pos = 0;
                self.peek = 0;
                self.state = LexerState::Input;
                trace!(offset, source = ?source, "lex");
                return Some(RawToken { offset, source });
            }
            self.state = match self.state {
                LexerState::Input => self.lex_input(),
                LexerState::WhiteSpace => self.lex_white_space(),
                LexerState::LineComment => self.lex_line_comment(),
                LexerState::BlockComment => self.lex_block_comment(),
                LexerState::QuotedScalar => self.lex_quoted_scalar(),
            };
        }
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.buffer.get(index..).and_then(|rest| rest.chars().next())
    }

    /// Suspend until more input arrives, keeping the current partial token.
    fn at_end(&mut self, state: LexerState) -> LexerState {
        self.buffer.drain(..self.pos);
        self.base += self.pos;
        self.peek -= self.pos;
        self.pos = 0;
        self.suspended = true;
        state
    }

    /// Push `buffer[pos..peek]` as a token if it is not empty.
    fn push_token(&mut self) {
        if self.peek > self.pos {
            self.queue.push_back(RawToken {
                offset: self.base + self.pos,
                source: String::from(&self.buffer[self.pos..self.peek]),
            });
            self.pos = self.peek;
        }
    }

    /// Push a token of `len` bytes starting at `peek`.
    fn push_single(&mut self, len: usize) {
        self.peek += len;
        self.push_token();
    }

    fn lex_input(&mut self) -> LexerState {
        let Some(ch) = self.char_at(self.peek) else {
            return self.at_end(LexerState::Input);
        };
        if ch == '\r' {
            self.push_token();
            match self.char_at(self.peek + 1) {
                None => self.at_end(LexerState::Input),
                Some('\n') => {
                    self.push_single(2);
                    LexerState::Input
                }
                Some(_) => {
                    self.push_single(1);
                    LexerState::Input
                }
            }
        } else if is_break(ch) || is_flow_indicator(ch) {
            self.push_token();
            self.push_single(ch.len_utf8());
            LexerState::Input
        } else if is_space(ch) {
            self.push_token();
            self.peek += ch.len_utf8();
            LexerState::WhiteSpace
        } else if ch == '/' {
            match self.char_at(self.peek + 1) {
                None => self.at_end(LexerState::Input),
                Some('/') => {
                    self.push_token();
                    self.peek += 2;
                    LexerState::LineComment
                }
                Some('*') => {
                    self.push_token();
                    self.peek += 2;
                    LexerState::BlockComment
                }
                Some(_) => {
                    self.peek += 1;
                    LexerState::Input
                }
            }
        } else if is_quote(ch) {
            self.push_token();
            self.peek += 1;
            LexerState::QuotedScalar
        } else {
            self.peek += ch.len_utf8();
            LexerState::Input
        }
    }

    fn lex_white_space(&mut self) -> LexerState {
        match self.char_at(self.peek) {
            None => self.at_end(LexerState::WhiteSpace),
            Some(ch) if is_space(ch) => {
                self.peek += ch.len_utf8();
                LexerState::WhiteSpace
            }
            Some(_) => {
                self.push_token();
                LexerState::Input
            }
        }
    }

    fn lex_line_comment(&mut self) -> LexerState {
        match self.char_at(self.peek) {
            None => self.at_end(LexerState::LineComment),
            Some(ch) if is_break(ch) => {
                self.push_token();
                LexerState::Input
            }
            Some(ch) => {
                self.peek += ch.len_utf8();
                LexerState::LineComment
            }
        }
    }

    fn lex_block_comment(&mut self) -> LexerState {
        match self.char_at(self.peek) {
            None => self.at_end(LexerState::BlockComment),
            Some('*') => match self.char_at(self.peek + 1) {
                None => self.at_end(LexerState::BlockComment),
                Some('/') => {
                    self.push_single(2);
                    LexerState::Input
                }
                Some(_) => {
                    self.peek += 1;
                    LexerState::BlockComment
                }
            },
            Some(ch) => {
                self.peek += ch.len_utf8();
                LexerState::BlockComment
            }
        }
    }

    fn lex_quoted_scalar(&mut self) -> LexerState {
        let quote = self.char_at(self.pos);
        match self.char_at(self.peek) {
            None => self.at_end(LexerState::QuotedScalar),
            Some(ch) if Some(ch) == quote => {
                self.push_single(1);
                LexerState::Input
            }
            Some('\\') => {
                let Some(escaped) = self.char_at(self.peek + 1) else {
                    return self.at_end(LexerState::QuotedScalar);
                };
                if escaped == '\r' {
                    match self.char_at(self.peek + 2) {
                        None => return self.at_end(LexerState::QuotedScalar),
                        Some('\n') => self.peek += 1,
                        Some(_) => {}
                    }
                }
                self.peek += 1 + escaped.len_utf8();
                LexerState::QuotedScalar
            }
            Some('\r' | '\n') => {
                self.push_token();
                LexerState::Input
            }
            Some(ch) => {
                self.peek += ch.len_utf8();
                LexerState::QuotedScalar
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex_all(source: &str) -> Vec<String> {
        Lexer::new().lex(source, false).map(|t| t.source).collect()
    }

    #[test]
    fn structural_tokens() {
        assert_eq!(
            lex_all("{ab:[1,2]}"),
            ["{", "ab", ":", "[", "1", ",", "2", "]", "}"]
        );
    }

    #[test]
    fn white_space_runs_coalesce() {
        assert_eq!(lex_all("a \t\u{a0}b"), ["a", " \t\u{a0}", "b"]);
        assert_eq!(lex_all("\u{feff}1"), ["\u{feff}", "1"]);
    }

    #[test]
    fn line_breaks() {
        assert_eq!(lex_all("a\r\nb\rc\n"), ["a", "\r\n", "b", "\r", "c", "\n"]);
        assert_eq!(lex_all("a\u{2028}b"), ["a", "\u{2028}", "b"]);
    }

    #[test]
    fn comments() {
        assert_eq!(lex_all("1 // x\n2"), ["1", " ", "// x", "\n", "2"]);
        assert_eq!(lex_all("1/* a\n*b */2"), ["1", "/* a\n*b */", "2"]);
        assert_eq!(lex_all("/*/ x */"), ["/*/ x */"]);
        assert_eq!(lex_all("a/b"), ["a/b"]);
    }

    #[test]
    fn quoted_scalars() {
        assert_eq!(lex_all(r#""a\"b" 'c'"#), [r#""a\"b""#, " ", "'c'"]);
        assert_eq!(lex_all("\"a'b\""), ["\"a'b\""]);
        assert_eq!(lex_all("'a\\\r\nb'"), ["'a\\\r\nb'"]);
        assert_eq!(lex_all("'a\nb'"), ["'a", "\n", "b", "'"]);
    }

    #[test]
    fn offsets() {
        let tokens: Vec<(usize, String)> = Lexer::new()
            .lex("[é, 2]", false)
            .map(|t| (t.offset, t.source))
            .collect();
        assert_eq!(
            tokens,
            [
                (0, "[".to_owned()),
                (1, "é".to_owned()),
                (3, ",".to_owned()),
                (4, " ".to_owned()),
                (5, "2".to_owned()),
                (6, "]".to_owned()),
            ]
        );
    }

    #[test]
    fn suspends_on_incomplete_input() {
        let mut lexer = Lexer::new();
        let first: Vec<String> = lexer.lex("[abc\r", true).map(|t| t.source).collect();
        assert_eq!(first, ["[", "abc"]);
        let second: Vec<String> = lexer.lex("\n/* x *", true).map(|t| t.source).collect();
        assert_eq!(second, ["\r\n"]);
        assert_eq!(lexer.state(), LexerState::BlockComment);
        let third: Vec<String> = lexer.lex("/]", false).map(|t| t.source).collect();
        assert_eq!(third, ["/* x */", "]"]);
    }

    #[test]
    fn flushes_partial_token_at_end() {
        assert_eq!(lex_all("\"abc"), ["\"abc"]);
        assert_eq!(lex_all("/* abc"), ["/* abc"]);
        assert_eq!(lex_all("1\r"), ["1", "\r"]);
        assert_eq!(lex_all("/"), ["/"]);

        let mut lexer = Lexer::new();
        assert_eq!(lexer.lex("'a", false).count(), 1);
        assert_eq!(lexer.state(), LexerState::Input);
        let next: Vec<String> = lexer.lex("b", false).map(|t| t.source).collect();
        assert_eq!(next, ["b"]);
    }
}

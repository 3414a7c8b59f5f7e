#![doc = include_str!("../README.md")]
#![doc(html_root_url = "https://docs.rs/json5-cst/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::fn_params_excessive_bools,
    clippy::manual_range_contains,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::unnecessary_wraps,
    clippy::match_wildcard_for_single_variants
)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod macros;

mod compose;
mod composer;
pub mod cst;
mod document;
mod error;
mod lexer;
mod line_counter;
mod options;
mod parser;
mod resolve;
mod scalar;
mod tags;
mod token;
mod value;

pub use crate::composer::*;
pub use crate::cst::CstToken;
pub use crate::document::*;
pub use crate::error::*;
pub use crate::lexer::*;
pub use crate::line_counter::*;
pub use crate::options::*;
pub use crate::parser::*;
pub use crate::scalar::{is_identifier, is_identifier_part, is_identifier_start};
pub use crate::tags::*;
pub use crate::token::*;
pub use crate::value::*;

/// The tag for `null`.
pub const NULL_TAG: &str = "tag:json5.org:null";
/// The tag for `true` and `false`.
pub const BOOL_TAG: &str = "tag:json5.org:bool";
/// The tag for string values, quoted or not.
pub const STR_TAG: &str = "tag:json5.org:str";
/// The tag for decimal and hexadecimal integers.
pub const INT_TAG: &str = "tag:json5.org:int";
/// The tag for floats, including `Infinity` and `NaN`.
pub const FLOAT_TAG: &str = "tag:json5.org:float";
/// The tag of `[ ... ]` sequences.
pub const SEQ_TAG: &str = "tag:json5.org:seq";
/// The tag of `{ ... }` maps.
pub const MAP_TAG: &str = "tag:json5.org:map";

/// The default limit on collection nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Scalar styles.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum ScalarStyle {
    /// The plain scalar style: numbers, keywords and identifiers.
    #[default]
    Plain,
    /// The single-quoted scalar style.
    SingleQuoted,
    /// The double-quoted scalar style.
    DoubleQuoted,
}

/// Parse and compose every document in `source`.
///
/// Always returns at least one document. Problems are reported in each
/// document's [`errors`](Document::errors) and
/// [`warnings`](Document::warnings).
pub fn parse_all(source: &str) -> Vec<Document> {
    parse_all_with(source, &ComposeOptions::default())
}

/// Like [`parse_all`], with options.
pub fn parse_all_with(source: &str, options: &ComposeOptions) -> Vec<Document> {
    let mut parser = Parser::new();
    parser.set_max_depth(options.max_depth);
    let mut composer = Composer::new(options.clone());
    composer
        .compose(parser.parse(source, false), true, source.len())
        .collect()
}

/// Parse a single document, failing on the first error.
///
/// ```
/// # use json5_cst::{parse_document, Value};
/// let doc = parse_document("{unquoted: 'and you can quote me on that'}")?;
/// assert_eq!(
///     doc.to_value().get("unquoted").and_then(Value::as_str),
///     Some("and you can quote me on that"),
/// );
/// assert!(parse_document("[1,,2]").is_err());
/// # Ok::<(), json5_cst::Error>(())
/// ```
pub fn parse_document(source: &str) -> Result<Document, Error> {
    let mut docs = parse_all(source);
    if docs.len() != 1 {
        return Err(Error::DocumentCount(docs.len()));
    }
    let Some(doc) = docs.pop() else {
        return Err(Error::DocumentCount(0));
    };
    match doc.errors.first() {
        Some(error) => Err(Error::Diagnostic(error.clone())),
        None => Ok(doc),
    }
}

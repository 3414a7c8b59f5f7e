use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::scalar::is_identifier;
use crate::{Scalar, TagError, Value, BOOL_TAG, FLOAT_TAG, INT_TAG, NULL_TAG, STR_TAG};

static NULL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^null$").unwrap());
static BOOL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:true|false)$").unwrap());
static INT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?(?:0|[1-9][0-9]*)$").unwrap());
static HEX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?0[xX][0-9a-fA-F]+$").unwrap());
static FLOAT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:(?:0|[1-9][0-9]*)(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][-+]?[0-9]+)?$").unwrap()
});
static FLOAT_SPECIAL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:Infinity|NaN)$").unwrap());

/// How a scalar was written, beyond what its value says.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[non_exhaustive]
pub enum Format {
    /// A hexadecimal integer such as `0x2A`.
    Hex,
    /// An unquoted identifier such as `foo`.
    Identifier,
}

/// What a [`ScalarTag`] resolved a scalar to.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved {
    /// A plain value, to be wrapped in a scalar carrying the tag's name and
    /// format.
    Value(Value),
    /// A complete scalar, used as is apart from its source position.
    Scalar(Scalar),
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Value(value)
    }
}

/// Settings and diagnostics sink passed to [`ScalarTag::resolve`].
#[derive(Debug)]
pub struct ResolveContext {
    int_as_bigint: bool,
    pub(crate) warnings: Vec<String>,
    pub(crate) errors: Vec<String>,
}

impl ResolveContext {
    pub fn new(int_as_bigint: bool) -> Self {
        ResolveContext {
            int_as_bigint,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Should integers that do not fit in an `i64` resolve to
    /// [`Value::BigInt`]?
    pub fn int_as_bigint(&self) -> bool {
        self.int_as_bigint
    }

    /// Report a problem that does not prevent resolution.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Report an error while still returning a value.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// A scalar type: recognizes plain scalar text, resolves it to a
/// [`Value`], and writes values back as JSON5.
pub trait ScalarTag: fmt::Debug + Send + Sync {
    /// The tag name, such as [`INT_TAG`](crate::INT_TAG).
    fn tag(&self) -> &str;

    /// The format recorded on scalars resolved by this tag.
    fn format(&self) -> Option<Format> {
        None
    }

    /// Does this tag apply to the plain scalar `text`?
    fn matches(&self, text: &str) -> bool;

    fn resolve(&self, text: &str, ctx: &mut ResolveContext) -> Result<Resolved, TagError>;

    /// Can this tag stringify `value`?
    fn identify(&self, value: &Value) -> bool;

    /// Write `value` as JSON5 text, or `None` if it is not of this tag.
    fn stringify(&self, value: &Value) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullTag;

impl ScalarTag for NullTag {
    fn tag(&self) -> &str {
        NULL_TAG
    }

    fn matches(&self, text: &str) -> bool {
        NULL_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        Ok(Resolved::Scalar(Scalar::new(Value::Null, text, NULL_TAG)))
    }

    fn identify(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        value.is_null().then(|| String::from("null"))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BoolTag;

impl ScalarTag for BoolTag {
    fn tag(&self) -> &str {
        BOOL_TAG
    }

    fn matches(&self, text: &str) -> bool {
        BOOL_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        Ok(Value::Bool(text == "true").into())
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(_))
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        value.as_bool().map(|b| String::from(if b { "true" } else { "false" }))
    }
}

/// Decimal integers.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntTag;

impl ScalarTag for IntTag {
    fn tag(&self) -> &str {
        INT_TAG
    }

    fn matches(&self, text: &str) -> bool {
        INT_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        let (negative, digits) = split_sign(text);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_int(text));
        }
        resolve_int(text, negative, digits, 10, ctx)
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_) | Value::BigInt(_))
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        match value {
            Value::Int(i) => Some(i.to_string()),
            Value::BigInt(i) => Some(i.to_string()),
            _ => None,
        }
    }
}

/// Hexadecimal integers such as `0x2A`, written back as `0x2a`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HexIntTag;

impl ScalarTag for HexIntTag {
    fn tag(&self) -> &str {
        INT_TAG
    }

    fn format(&self) -> Option<Format> {
        Some(Format::Hex)
    }

    fn matches(&self, text: &str) -> bool {
        HEX_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        let (negative, rest) = split_sign(text);
        let digits = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
            .filter(|digits| {
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
            })
            .ok_or_else(|| invalid_int(text))?;
        resolve_int(text, negative, digits, 16, ctx)
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_) | Value::BigInt(_))
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        let n = match value {
            Value::Int(i) => i128::from(*i),
            Value::BigInt(i) => *i,
            _ => return None,
        };
        let sign = if n < 0 { "-" } else { "" };
        Some(format!("{sign}0x{:x}", n.unsigned_abs()))
    }
}

fn invalid_int(text: &str) -> TagError {
    TagError::Invalid {
        kind: "int",
        text: String::from(text),
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn resolve_int(
    text: &str,
    negative: bool,
    digits: &str,
    radix: u32,
    ctx: &mut ResolveContext,
) -> Result<Resolved, TagError> {
    let magnitude = u128::from_str_radix(digits, radix).ok();
    let n = magnitude.and_then(|m| {
        if negative {
            0_i128.checked_sub_unsigned(m)
        } else {
            i128::try_from(m).ok()
        }
    });
    if let Some(n) = n {
        if let Ok(small) = i64::try_from(n) {
            return Ok(Value::Int(small).into());
        }
        if ctx.int_as_bigint() {
            return Ok(Value::BigInt(n).into());
        }
    } else if ctx.int_as_bigint() {
        return Err(TagError::OutOfRange(String::from(text)));
    }
    ctx.warn(format!(
        "Integer {text} does not fit in 64 bits and was read as a float"
    ));
    let mut x = if radix == 10 {
        digits.parse::<f64>().unwrap_or(f64::INFINITY)
    } else {
        digits.chars().fold(0.0, |acc, ch| {
            acc * f64::from(radix) + f64::from(ch.to_digit(radix).unwrap_or(0))
        })
    };
    if negative {
        x = -x;
    }
    Ok(Value::Float(x).into())
}

/// Decimal and exponent floats.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatTag;

impl ScalarTag for FloatTag {
    fn tag(&self) -> &str {
        FLOAT_TAG
    }

    fn matches(&self, text: &str) -> bool {
        FLOAT_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        text.parse::<f64>()
            .map(|x| Value::Float(x).into())
            .map_err(|_| TagError::Invalid {
                kind: "float",
                text: String::from(text),
            })
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::Float(x) if x.is_finite())
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        match value {
            Value::Float(x) if x.is_finite() => {
                let mut text = x.to_string();
                if !text.contains('.') {
                    text.push_str(".0");
                }
                Some(text)
            }
            _ => None,
        }
    }
}

/// `Infinity`, `-Infinity` and `NaN`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatSpecialTag;

impl ScalarTag for FloatSpecialTag {
    fn tag(&self) -> &str {
        FLOAT_TAG
    }

    fn matches(&self, text: &str) -> bool {
        FLOAT_SPECIAL_REGEX.is_match(text)
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        let x = match split_sign(text) {
            (_, "NaN") => f64::NAN,
            (true, _) => f64::NEG_INFINITY,
            (false, _) => f64::INFINITY,
        };
        Ok(Value::Float(x).into())
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::Float(x) if !x.is_finite())
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        match value {
            Value::Float(x) if x.is_nan() => Some(String::from("NaN")),
            Value::Float(x) if *x == f64::INFINITY => Some(String::from("Infinity")),
            Value::Float(x) if *x == f64::NEG_INFINITY => Some(String::from("-Infinity")),
            _ => None,
        }
    }
}

/// Unquoted identifiers used as strings, such as object keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentifierTag;

impl ScalarTag for IdentifierTag {
    fn tag(&self) -> &str {
        STR_TAG
    }

    fn format(&self) -> Option<Format> {
        Some(Format::Identifier)
    }

    fn matches(&self, text: &str) -> bool {
        is_identifier(text)
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        Ok(Value::from(text).into())
    }

    fn identify(&self, value: &Value) -> bool {
        value.as_str().is_some_and(is_identifier)
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        value
            .as_str()
            .filter(|s| is_identifier(s))
            .map(String::from)
    }
}

/// Any string. Used for quoted scalars, and for plain scalars no other tag
/// matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringTag;

impl ScalarTag for StringTag {
    fn tag(&self) -> &str {
        STR_TAG
    }

    fn matches(&self, _text: &str) -> bool {
        true
    }

    fn resolve(&self, text: &str, _ctx: &mut ResolveContext) -> Result<Resolved, TagError> {
        Ok(Value::from(text).into())
    }

    fn identify(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    fn stringify(&self, value: &Value) -> Option<String> {
        let s = value.as_str()?;
        Some(serde_json::Value::String(String::from(s)).to_string())
    }
}

/// An ordered list of [`ScalarTag`]s. The first tag whose
/// [`matches`](ScalarTag::matches) accepts a plain scalar resolves it; when
/// none does, the fallback string tag is used.
#[derive(Clone, Debug)]
pub struct TagRegistry {
    tags: Vec<Arc<dyn ScalarTag>>,
    fallback: Arc<dyn ScalarTag>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::json5()
    }
}

impl TagRegistry {
    /// The JSON5 tags: null, booleans, decimal and hexadecimal integers,
    /// floats, `Infinity` and `NaN`, identifiers, and strings.
    pub fn json5() -> Self {
        TagRegistry {
            tags: vec![
                Arc::new(NullTag),
                Arc::new(BoolTag),
                Arc::new(IntTag),
                Arc::new(HexIntTag),
                Arc::new(FloatTag),
                Arc::new(FloatSpecialTag),
                Arc::new(IdentifierTag),
            ],
            fallback: Arc::new(StringTag),
        }
    }

    /// Try `tag` before every other tag.
    #[must_use]
    pub fn prepend(mut self, tag: impl ScalarTag + 'static) -> Self {
        self.tags.insert(0, Arc::new(tag));
        self
    }

    /// Try `tag` after every other tag, but before the string fallback.
    #[must_use]
    pub fn append(mut self, tag: impl ScalarTag + 'static) -> Self {
        self.tags.push(Arc::new(tag));
        self
    }

    pub fn tags(&self) -> impl Iterator<Item = &dyn ScalarTag> {
        self.tags.iter().map(|tag| &**tag)
    }

    /// The first tag that matches the plain scalar `text`.
    pub fn match_plain(&self, text: &str) -> Option<&dyn ScalarTag> {
        self.tags().find(|tag| tag.matches(text))
    }

    /// The string tag used when no other tag applies.
    pub fn fallback(&self) -> &dyn ScalarTag {
        &*self.fallback
    }

    /// Write `value` as JSON5, preferring a tag with the given `format`.
    pub fn stringify(&self, value: &Value, format: Option<Format>) -> Option<String> {
        let candidates: Vec<&dyn ScalarTag> = self
            .tags()
            .chain(core::iter::once(self.fallback()))
            .filter(|tag| tag.identify(value))
            .collect();
        let tag = candidates
            .iter()
            .find(|tag| format.is_some() && tag.format() == format)
            .or_else(|| candidates.iter().find(|tag| tag.format().is_none()))
            .or_else(|| candidates.first())?;
        tag.stringify(value)
    }
}

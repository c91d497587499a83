use crate::vocab::{is_float_datatype, is_integer_datatype, xsd};
use crate::ResourceId;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// The prefix that marks a language tag in the stored tag column.
pub const LANGUAGE_MARKER: char = '@';

/// The opaque scalar stored in the value column of a literal triple.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Integer(i64),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl LiteralValue {
    /// Returns the lexical form of the value, ignoring its datatype.
    pub fn lexical_form(&self) -> Cow<'_, str> {
        match self {
            LiteralValue::Integer(value) => Cow::Owned(value.to_string()),
            LiteralValue::Double(value) => Cow::Owned(format_double(*value)),
            LiteralValue::Text(value) => Cow::Borrowed(value.as_str()),
            LiteralValue::Blob(value) => String::from_utf8_lossy(value),
        }
    }
}

fn format_double(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lexical_form())
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        LiteralValue::Integer(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Double(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Integer(i64::from(value))
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::Text(value.to_owned())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::Text(value)
    }
}

/// Discriminates the kind of a stored literal.
///
/// The tag column stores `0` for [LiteralTag::Plain], the language prefixed with
/// [LANGUAGE_MARKER] for [LiteralTag::Language], and the datatype's resource id otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralTag {
    Plain,
    Language(String),
    Datatype(ResourceId),
}

impl LiteralTag {
    /// Creates a language tag. Language tags are case-insensitive and stored in lower case.
    pub fn language(language: &str) -> Self {
        LiteralTag::Language(language.to_ascii_lowercase())
    }

    /// Decodes a tag that was stored as an integer.
    pub fn from_stored_integer(value: i64) -> Self {
        if value == 0 {
            LiteralTag::Plain
        } else {
            LiteralTag::Datatype(ResourceId::new(value))
        }
    }

    /// Decodes a tag that was stored as text. Returns [None] if `value` is not a language marker.
    pub fn from_stored_text(value: &str) -> Option<Self> {
        value
            .strip_prefix(LANGUAGE_MARKER)
            .map(|language| LiteralTag::Language(language.to_owned()))
    }

    /// The integer representation of the tag, if it has one.
    pub fn stored_integer(&self) -> Option<i64> {
        match self {
            LiteralTag::Plain => Some(0),
            LiteralTag::Language(_) => None,
            LiteralTag::Datatype(datatype) => Some(datatype.as_i64()),
        }
    }

    /// The text representation of the tag, if it has one.
    pub fn stored_text(&self) -> Option<String> {
        match self {
            LiteralTag::Language(language) => Some(format!("{LANGUAGE_MARKER}{language}")),
            LiteralTag::Plain | LiteralTag::Datatype(_) => None,
        }
    }
}

/// A literal as it is stored in the literal relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    value: LiteralValue,
    tag: LiteralTag,
}

impl Literal {
    pub fn new(value: impl Into<LiteralValue>, tag: LiteralTag) -> Self {
        Self {
            value: value.into(),
            tag,
        }
    }

    /// Creates an untyped string literal.
    pub fn simple(value: impl Into<String>) -> Self {
        Self::new(LiteralValue::Text(value.into()), LiteralTag::Plain)
    }

    pub fn language_tagged(value: impl Into<String>, language: &str) -> Self {
        Self::new(LiteralValue::Text(value.into()), LiteralTag::language(language))
    }

    /// Creates a typed literal from its lexical form.
    ///
    /// Numeric and boolean datatypes are stored as SQL numbers so that comparisons and
    /// arithmetic work on the stored value. A lexical form that is not valid for the datatype is
    /// kept as text.
    pub fn from_lexical(lexical: &str, datatype: ResourceId) -> Self {
        if datatype == xsd::STRING {
            return Self::simple(lexical);
        }

        let value = if is_integer_datatype(datatype) {
            lexical
                .trim()
                .parse::<i64>()
                .map_or_else(|_| LiteralValue::Text(lexical.to_owned()), LiteralValue::Integer)
        } else if is_float_datatype(datatype) {
            lexical
                .trim()
                .parse::<f64>()
                .map_or_else(|_| LiteralValue::Text(lexical.to_owned()), LiteralValue::Double)
        } else if datatype == xsd::BOOLEAN {
            match lexical.trim() {
                "true" | "1" => LiteralValue::Integer(1),
                "false" | "0" => LiteralValue::Integer(0),
                _ => LiteralValue::Text(lexical.to_owned()),
            }
        } else {
            LiteralValue::Text(lexical.to_owned())
        };
        Self::new(value, LiteralTag::Datatype(datatype))
    }

    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    pub fn tag(&self) -> &LiteralTag {
        &self.tag
    }

    pub fn into_parts(self) -> (LiteralValue, LiteralTag) {
        (self.value, self.tag)
    }

    /// Returns the language of a language-tagged literal.
    pub fn language(&self) -> Option<&str> {
        match &self.tag {
            LiteralTag::Language(language) => Some(language),
            _ => None,
        }
    }

    /// Returns the lexical form, rendering booleans as `true` / `false`.
    pub fn lexical_form(&self) -> Cow<'_, str> {
        match (&self.value, &self.tag) {
            (LiteralValue::Integer(value), LiteralTag::Datatype(xsd::BOOLEAN)) => {
                Cow::Borrowed(if *value == 0 { "false" } else { "true" })
            }
            (value, _) => value.lexical_form(),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::new(value, LiteralTag::Datatype(xsd::INTEGER))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::new(value, LiteralTag::Datatype(xsd::DOUBLE))
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::new(value, LiteralTag::Datatype(xsd::BOOLEAN))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::simple(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::simple(value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", self.lexical_form().replace('"', "\\\""))?;
        match &self.tag {
            LiteralTag::Plain => Ok(()),
            LiteralTag::Language(language) => write!(f, "@{language}"),
            LiteralTag::Datatype(datatype) => write!(f, "^^#{datatype}"),
        }
    }
}

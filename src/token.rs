use std::fmt;

/// A single lexical event pulled from a JSON document.
///
/// Object boundaries carry the name of the field whose value they are, so
/// `"point": { ... }` produces `ObjectStart(Some("point"))` and a matching
/// `ObjectEnd(Some("point"))`. The root object and array elements are
/// unnamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    ObjectStart(Option<String>),
    ObjectEnd(Option<String>),
    ArrayStart,
    ArrayEnd,
    FieldName(String),
    /// String contents (unescaped), number source text, or the literal
    /// `true` / `false` / `null`.
    ScalarValue(String),
    EndOfStream,
}

impl Token {
    /// The field name, when this token is one.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Token::FieldName(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Token::ScalarValue(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::ObjectStart(Some(name)) => write!(f, "{{ ({name})"),
            Token::ObjectStart(None) => f.write_str("{"),
            Token::ObjectEnd(Some(name)) => write!(f, "}} ({name})"),
            Token::ObjectEnd(None) => f.write_str("}"),
            Token::ArrayStart => f.write_str("["),
            Token::ArrayEnd => f.write_str("]"),
            Token::FieldName(name) => write!(f, "{name:?}:"),
            Token::ScalarValue(text) => write!(f, "{text:?}"),
            Token::EndOfStream => f.write_str("<eos>"),
        }
    }
}

//! DataPath tokenizing and rendering.
//!
//! Grammar (the host's attribute-path syntax):
//!   segment ( '.' field | '[' int ']' | '["' key '"]' )*
//! - the first segment is a bare field name or a bracket subscript (no leading '.')
//! - field names are word characters (alphanumeric or '_')
//! - quoted keys may contain `\"` and `\\` escapes
//!
//! Examples:
//!   location[2]               -> [Field(location), Index(2)]
//!   modifiers["Mod \"A\""].levels -> [Field(modifiers), Key(Mod "A"), Field(levels)]
//!   ["custom"]                -> [Key(custom)]
//!
//! Anything else (stray characters, unterminated brackets or quotes, whitespace)
//! is rejected. Callers treat a rejected path as "not resolvable".

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};
use thiserror::Error;

/// One segment of a data path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PathToken {
    /// `.name` (or the leading bare name)
    Field(String),
    /// `[123]`
    Index(usize),
    /// `["key"]`, stored unescaped
    Key(String),
}

impl PathToken {
    pub fn field(name: impl Into<String>) -> Self {
        PathToken::Field(name.into())
    }

    pub fn key(key: impl Into<String>) -> Self {
        PathToken::Key(key.into())
    }

    /// Append this token's textual form. `first` suppresses the leading dot of a field.
    pub fn render_into(&self, out: &mut String, first: bool) {
        match self {
            PathToken::Field(name) => {
                if !first {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathToken::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathToken::Key(key) => {
                out.push_str("[\"");
                for c in key.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push_str("\"]");
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty data path")]
    Empty,
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { offset: usize, found: char },
    #[error("expected a field name at offset {offset}")]
    ExpectedField { offset: usize },
    #[error("empty subscript at offset {offset}")]
    EmptySubscript { offset: usize },
    #[error("unterminated subscript opened at offset {offset}")]
    UnterminatedBracket { offset: usize },
    #[error("unterminated quoted key opened at offset {offset}")]
    UnterminatedKey { offset: usize },
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    #[error("subscript index too large at offset {offset}")]
    IndexOverflow { offset: usize },
}

/// A tokenized data path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DataPath {
    tokens: Vec<PathToken>,
}

type Scanner<'a> = Peekable<CharIndices<'a>>;

#[inline]
fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn scan_word(chars: &mut Scanner<'_>) -> String {
    let mut word = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_word(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn expect_close(chars: &mut Scanner<'_>, open: usize) -> Result<(), PathError> {
    match chars.next() {
        Some((_, ']')) => Ok(()),
        Some((offset, found)) => Err(PathError::Unexpected { offset, found }),
        None => Err(PathError::UnterminatedBracket { offset: open }),
    }
}

/// Scan what follows a '[' at `open`, consuming the closing ']'.
fn scan_subscript(chars: &mut Scanner<'_>, open: usize) -> Result<PathToken, PathError> {
    match chars.peek().copied() {
        None => Err(PathError::UnterminatedBracket { offset: open }),
        Some((offset, ']')) => Err(PathError::EmptySubscript { offset }),
        Some((_, '"')) => {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    None => return Err(PathError::UnterminatedKey { offset: open }),
                    Some((_, '"')) => break,
                    Some((offset, '\\')) => match chars.next() {
                        Some((_, c @ ('"' | '\\'))) => key.push(c),
                        Some(_) => return Err(PathError::InvalidEscape { offset }),
                        None => return Err(PathError::UnterminatedKey { offset: open }),
                    },
                    Some((_, c)) => key.push(c),
                }
            }
            expect_close(chars, open)?;
            Ok(PathToken::Key(key))
        }
        Some((offset, c)) if c.is_ascii_digit() => {
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            let index = digits
                .parse::<usize>()
                .map_err(|_| PathError::IndexOverflow { offset })?;
            expect_close(chars, open)?;
            Ok(PathToken::Index(index))
        }
        Some((offset, found)) => Err(PathError::Unexpected { offset, found }),
    }
}

impl DataPath {
    /// Construct a DataPath from tokens.
    pub fn new(tokens: Vec<PathToken>) -> Self {
        Self { tokens }
    }

    /// Tokenize a path string according to the grammar described above.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let mut tokens = Vec::new();
        let mut chars = s.char_indices().peekable();
        while let Some(&(offset, c)) = chars.peek() {
            match c {
                '.' if !tokens.is_empty() => {
                    chars.next();
                    let name = scan_word(&mut chars);
                    if name.is_empty() {
                        return Err(PathError::ExpectedField { offset: offset + 1 });
                    }
                    tokens.push(PathToken::Field(name));
                }
                '[' => {
                    chars.next();
                    tokens.push(scan_subscript(&mut chars, offset)?);
                }
                c if tokens.is_empty() && is_word(c) => {
                    tokens.push(PathToken::Field(scan_word(&mut chars)));
                }
                found => return Err(PathError::Unexpected { offset, found }),
            }
        }
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<PathToken> {
        self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last(&self) -> Option<&PathToken> {
        self.tokens.last()
    }

    /// Append a token, returning the extended path.
    pub fn join(mut self, token: PathToken) -> Self {
        self.tokens.push(token);
        self
    }

    /// Path made of the first `n` tokens.
    pub fn prefix(&self, n: usize) -> DataPath {
        DataPath::new(self.tokens[..n.min(self.tokens.len())].to_vec())
    }
}

/// Split a path string into tokens.
pub fn disassemble(path: &str) -> Result<Vec<PathToken>, PathError> {
    DataPath::parse(path).map(DataPath::into_tokens)
}

/// Render tokens back into a path string.
pub fn render(tokens: &[PathToken]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        token.render_into(&mut out, i == 0);
    }
    out
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.tokens))
    }
}

impl FromStr for DataPath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataPath::parse(s)
    }
}

// Serde support: serialize as string, deserialize from string
impl Serialize for DataPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DataPath {
    fn deserialize<D>(deserializer: D) -> Result<DataPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataPath::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fields_and_index() {
        let p = DataPath::parse("pose.bones.location[2]").unwrap();
        assert_eq!(
            p.tokens(),
            &[
                PathToken::field("pose"),
                PathToken::field("bones"),
                PathToken::field("location"),
                PathToken::Index(2),
            ]
        );
        assert_eq!(p.to_string(), "pose.bones.location[2]");
    }

    #[test]
    fn parse_quoted_key_with_escapes() {
        let p = DataPath::parse(r#"modifiers["Mod \"A\" \\ x"].levels"#).unwrap();
        assert_eq!(
            p.tokens(),
            &[
                PathToken::field("modifiers"),
                PathToken::key(r#"Mod "A" \ x"#),
                PathToken::field("levels"),
            ]
        );
        assert_eq!(p.to_string(), r#"modifiers["Mod \"A\" \\ x"].levels"#);
    }

    #[test]
    fn bracket_characters_inside_keys_do_not_terminate() {
        let p = DataPath::parse(r#"items["a]b.c[0]"]"#).unwrap();
        assert_eq!(
            p.tokens(),
            &[PathToken::field("items"), PathToken::key("a]b.c[0]")]
        );
    }

    #[test]
    fn leading_subscript_is_allowed() {
        let p = DataPath::parse(r#"["custom"][0]"#).unwrap();
        assert_eq!(p.tokens(), &[PathToken::key("custom"), PathToken::Index(0)]);
        assert_eq!(p.to_string(), r#"["custom"][0]"#);
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(DataPath::parse(""), Err(PathError::Empty));
        assert!(matches!(
            DataPath::parse(".size"),
            Err(PathError::Unexpected { offset: 0, .. })
        ));
        assert!(matches!(
            DataPath::parse("size."),
            Err(PathError::ExpectedField { .. })
        ));
        assert!(matches!(
            DataPath::parse("items[2"),
            Err(PathError::UnterminatedBracket { .. })
        ));
        assert!(matches!(
            DataPath::parse("items[]"),
            Err(PathError::EmptySubscript { .. })
        ));
        assert!(matches!(
            DataPath::parse(r#"items["open]"#),
            Err(PathError::UnterminatedKey { .. })
        ));
        assert!(matches!(
            DataPath::parse(r#"items["a\n"]"#),
            Err(PathError::InvalidEscape { .. })
        ));
        assert!(matches!(
            DataPath::parse("items[-1]"),
            Err(PathError::Unexpected { found: '-', .. })
        ));
        assert!(matches!(
            DataPath::parse("items[1]x"),
            Err(PathError::Unexpected { found: 'x', .. })
        ));
        assert!(DataPath::parse("my size").is_err());
        assert!(matches!(
            DataPath::parse("items[99999999999999999999999]"),
            Err(PathError::IndexOverflow { .. })
        ));
    }

    #[test]
    fn render_then_disassemble_is_stable() {
        let samples = [
            "size",
            "items[2]",
            r#"nodes["Principled \"BSDF\""].inputs[0].default_value"#,
            r#"["prop"]"#,
            "a.b.c[10][3]",
        ];
        for s in samples {
            let tokens = disassemble(s).unwrap();
            let rendered = render(&tokens);
            assert_eq!(disassemble(&rendered).unwrap(), tokens, "{s}");
        }
    }

    #[test]
    fn serde_as_string() {
        let p = DataPath::parse("items[2]").unwrap();
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, r#""items[2]""#);
        let back: DataPath = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<DataPath>(r#""items[""#).is_err());
    }
}

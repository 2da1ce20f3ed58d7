//! Rule path expressions and concrete document locations.
//!
//! A [`PathExpression`] is what a contract writes as a matching-rule key:
//! `$`, `$.items[*].id`, `$['content-type']`, `$.animals[*].*`. A
//! [`DocPath`] is one concrete location inside a JSON value, such as
//! `$.items[1].id`. Resolving an expression against a value yields the
//! concrete locations it denotes; wildcards expand over what is actually
//! present in that value.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// One step of a concrete location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElem {
    /// Object member
    Field(String),
    /// Array element
    Index(usize),
}

/// A concrete location inside a JSON value, rooted at `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(Vec<PathElem>);

impl DocPath {
    /// The root location `$`.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Location of an object member below this one.
    #[must_use]
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut elems = self.0.clone();
        elems.push(PathElem::Field(name.into()));
        Self(elems)
    }

    /// Location of an array element below this one.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut elems = self.0.clone();
        elems.push(PathElem::Index(index));
        Self(elems)
    }

    /// Steps from the root.
    #[must_use]
    pub fn elems(&self) -> &[PathElem] {
        &self.0
    }

    /// Whether this is `$`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for elem in &self.0 {
            match elem {
                PathElem::Field(name) if is_plain_name(name) => write!(f, ".{name}")?,
                PathElem::Field(name) => write!(f, "['{}']", name.replace('\'', "\\'"))?,
                PathElem::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// One segment of a rule path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathToken {
    /// A named field
    Field(String),
    /// A specific array index
    Index(usize),
    /// `[*]`: every element of an array
    AnyIndex,
    /// `.*`: every member of an object
    AnyField,
}

impl PathToken {
    fn matches(&self, elem: &PathElem) -> bool {
        match (self, elem) {
            (Self::Field(name), PathElem::Field(actual)) => name == actual,
            (Self::Index(index), PathElem::Index(actual)) => index == actual,
            (Self::AnyIndex, PathElem::Index(_)) | (Self::AnyField, PathElem::Field(_)) => true,
            _ => false,
        }
    }
}

/// Rejected path expression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed path expression `{expression}` at offset {offset}: {reason}")]
pub struct PathError {
    /// The expression as written
    pub expression: String,
    /// Byte offset of the problem
    pub offset: usize,
    /// What was wrong
    pub reason: String,
}

/// A parsed rule path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpression {
    raw: String,
    tokens: Vec<PathToken>,
}

impl PathExpression {
    /// Parse an expression such as `$.items[*].id`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the expression does not start at the root
    /// `$` or contains an unterminated or empty segment.
    pub fn parse(expression: &str) -> Result<Self, PathError> {
        Parser::new(expression).parse()
    }

    /// The expression addressing a single top-level member, e.g. a header.
    #[must_use]
    pub fn member(name: &str) -> Self {
        Self {
            raw: DocPath::root().field(name).to_string(),
            tokens: vec![PathToken::Field(name.to_string())],
        }
    }

    /// The expression addressing the root value.
    #[must_use]
    pub fn root() -> Self {
        Self {
            raw: "$".to_string(),
            tokens: Vec::new(),
        }
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments after the root.
    #[must_use]
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Number of segments; more segments means more specific.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.tokens.len()
    }

    /// Whether this expression denotes exactly the given location.
    #[must_use]
    pub fn matches(&self, path: &DocPath) -> bool {
        self.tokens.len() == path.elems().len()
            && self
                .tokens
                .iter()
                .zip(path.elems())
                .all(|(token, elem)| token.matches(elem))
    }

    /// Every location in `value` this expression denotes, in document order.
    ///
    /// Locations that do not exist in `value` are never produced.
    #[must_use]
    pub fn resolve(&self, value: &Value) -> Vec<DocPath> {
        let mut found = Vec::new();
        collect(&self.tokens, value, DocPath::root(), &mut found);
        found
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn collect(tokens: &[PathToken], value: &Value, at: DocPath, found: &mut Vec<DocPath>) {
    let Some((head, rest)) = tokens.split_first() else {
        found.push(at);
        return;
    };

    match (head, value) {
        (PathToken::Field(name), Value::Object(members)) => {
            if let Some(child) = members.get(name) {
                collect(rest, child, at.field(name.as_str()), found);
            }
        }
        (PathToken::AnyField, Value::Object(members)) => {
            for (name, child) in members {
                collect(rest, child, at.field(name.as_str()), found);
            }
        }
        (PathToken::Index(index), Value::Array(items)) => {
            if let Some(child) = items.get(*index) {
                collect(rest, child, at.index(*index), found);
            }
        }
        (PathToken::AnyIndex, Value::Array(items)) => {
            for (index, child) in items.iter().enumerate() {
                collect(rest, child, at.index(index), found);
            }
        }
        _ => {}
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn error(&self, offset: usize, reason: impl Into<String>) -> PathError {
        PathError {
            expression: self.source.to_string(),
            offset,
            reason: reason.into(),
        }
    }

    fn parse(mut self) -> Result<PathExpression, PathError> {
        match self.chars.next() {
            Some((_, '$')) => {}
            Some((offset, c)) => return Err(self.error(offset, format!("expected `$`, found `{c}`"))),
            None => return Err(self.error(0, "expression is empty")),
        }

        let mut tokens = Vec::new();
        while let Some((offset, c)) = self.chars.next() {
            let token = match c {
                '.' => self.dotted(offset)?,
                '[' => self.bracketed(offset)?,
                other => {
                    return Err(self.error(offset, format!("unexpected `{other}` between segments")));
                }
            };
            tokens.push(token);
        }

        Ok(PathExpression {
            raw: self.source.to_string(),
            tokens,
        })
    }

    fn dotted(&mut self, start: usize) -> Result<PathToken, PathError> {
        let mut name = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '.' || c == '[' {
                break;
            }
            if c == ']' || c == '\'' || c == '"' {
                let (offset, _) = self.chars.next().unwrap_or((start, c));
                return Err(self.error(offset, format!("`{c}` is not allowed in a field name")));
            }
            name.push(c);
            self.chars.next();
        }

        match name.as_str() {
            "" => Err(self.error(start, "empty field name after `.`")),
            "*" => Ok(PathToken::AnyField),
            _ => Ok(PathToken::Field(name)),
        }
    }

    fn bracketed(&mut self, start: usize) -> Result<PathToken, PathError> {
        let token = match self.chars.peek().map(|&(_, c)| c) {
            Some('*') => {
                self.chars.next();
                PathToken::AnyIndex
            }
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                PathToken::Field(self.quoted(start, quote)?)
            }
            Some(c) if c.is_ascii_digit() => PathToken::Index(self.index(start)?),
            Some(c) => return Err(self.error(start + 1, format!("unexpected `{c}` after `[`"))),
            None => return Err(self.error(start, "unterminated `[`")),
        };

        match self.chars.next() {
            Some((_, ']')) => Ok(token),
            Some((offset, c)) => Err(self.error(offset, format!("expected `]`, found `{c}`"))),
            None => Err(self.error(start, "unterminated `[`")),
        }
    }

    fn quoted(&mut self, start: usize, quote: char) -> Result<String, PathError> {
        let mut name = String::new();
        while let Some((_, c)) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some((_, escaped)) => name.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    if name.is_empty() {
                        return Err(self.error(start, "empty quoted field name"));
                    }
                    return Ok(name);
                }
                c => name.push(c),
            }
        }
        Err(self.error(start, "unterminated quoted field name"))
    }

    fn index(&mut self, start: usize) -> Result<usize, PathError> {
        let mut digits = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        digits
            .parse()
            .map_err(|_| self.error(start + 1, format!("index `{digits}` is out of range")))
    }
}

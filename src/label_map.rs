//! Loading of object-detection label maps in protobuf text format.
//!
//! ```text
//! item {
//!   id: 1
//!   name: 'dog'
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, ConvertResult, LabelMapError};

/// An immutable mapping from class name to positive class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    by_name: HashMap<String, i64>,
    by_id: BTreeMap<i64, String>,
}

#[derive(Debug, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Colon,
    Open,
    Close,
}

#[derive(Default)]
struct PendingItem {
    id: Option<i64>,
    name: Option<String>,
}

impl LabelMap {
    /// Read and parse a `.pbtxt` label map file.
    pub fn load(path: &Path) -> ConvertResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        Self::parse(&text).map_err(|source| ConvertError::MalformedLabelMap {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, LabelMapError> {
        let tokens = tokenize(text)?;
        let mut entries = Vec::new();
        let mut iter = tokens.into_iter();

        while let Some((line, token)) = iter.next() {
            match token {
                Token::Ident(ident) if ident == "item" => {
                    if !matches!(iter.next(), Some((_, Token::Open))) {
                        return Err(syntax(line, "expected `{` after `item`"));
                    }
                    let mut item = PendingItem::default();
                    let end_line = loop {
                        match iter.next() {
                            Some((line, Token::Close)) => break line,
                            Some((line, Token::Ident(field))) => {
                                if !matches!(iter.next(), Some((_, Token::Colon))) {
                                    return Err(syntax(
                                        line,
                                        format!("expected `:` after `{}`", field),
                                    ));
                                }
                                let value = match iter.next() {
                                    Some((_, Token::Ident(value))) | Some((_, Token::Str(value))) => {
                                        value
                                    }
                                    _ => {
                                        return Err(syntax(
                                            line,
                                            format!("missing value for `{}`", field),
                                        ))
                                    }
                                };
                                match field.as_str() {
                                    "id" => {
                                        let id = value.parse::<i64>().map_err(|_| {
                                            syntax(line, format!("invalid id '{}'", value))
                                        })?;
                                        item.id = Some(id);
                                    }
                                    "name" => item.name = Some(value),
                                    // display_name and friends are not used for lookup
                                    _ => {}
                                }
                            }
                            Some((line, _)) => {
                                return Err(syntax(line, "unexpected token inside `item`"))
                            }
                            None => return Err(syntax(line, "unterminated `item` block")),
                        }
                    };
                    let id = item.id.ok_or(LabelMapError::MissingField {
                        line: end_line,
                        field: "id",
                    })?;
                    let name = item.name.ok_or(LabelMapError::MissingField {
                        line: end_line,
                        field: "name",
                    })?;
                    entries.push((name, id));
                }
                _ => return Err(syntax(line, "expected `item`")),
            }
        }

        Self::from_entries(entries)
    }

    /// Build a label map from `(name, id)` pairs, validating ids and names.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, LabelMapError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut by_name = HashMap::new();
        let mut by_id: BTreeMap<i64, String> = BTreeMap::new();

        for (name, id) in entries {
            let name = name.into();
            if id <= 0 {
                return Err(LabelMapError::NonPositiveId { name, id });
            }
            if let Some(first) = by_id.get(&id) {
                return Err(LabelMapError::DuplicateId {
                    id,
                    first: first.clone(),
                    second: name,
                });
            }
            if by_name.contains_key(&name) {
                return Err(LabelMapError::DuplicateName(name));
            }
            by_id.insert(id, name.clone());
            by_name.insert(name, id);
        }

        Ok(Self { by_name, by_id })
    }

    pub fn get(&self, class_name: &str) -> Option<i64> {
        self.by_name.get(class_name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Class names ordered by id
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.by_id.values().map(String::as_str)
    }
}

fn syntax(line: usize, msg: impl Into<String>) -> LabelMapError {
    LabelMapError::Syntax {
        line,
        msg: msg.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>, LabelMapError> {
    let mut tokens = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let mut chars = raw_line.chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                '#' => break,
                c if c.is_whitespace() => {
                    chars.next();
                }
                '{' => {
                    chars.next();
                    tokens.push((line, Token::Open));
                }
                '}' => {
                    chars.next();
                    tokens.push((line, Token::Close));
                }
                ':' => {
                    chars.next();
                    tokens.push((line, Token::Colon));
                }
                '\'' | '"' => {
                    let quote = c;
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some('\\') => match chars.next() {
                                Some(escaped) => value.push(escaped),
                                None => return Err(syntax(line, "unterminated string")),
                            },
                            Some(c) => value.push(c),
                            None => return Err(syntax(line, "unterminated string")),
                        }
                    }
                    tokens.push((line, Token::Str(value)));
                }
                c if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' => {
                    let mut ident = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                            ident.push(c);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push((line, Token::Ident(ident)));
                }
                other => return Err(syntax(line, format!("unexpected character '{}'", other))),
            }
        }
    }

    Ok(tokens)
}

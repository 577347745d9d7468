//! Map document parser
//!
//! Parses the XML subset map files are written in: nested elements with
//! quoted attributes, comments, a leading `<?xml ...?>` prolog, and the five
//! predefined entities. Text content is kept but never interpreted.

use rgb_region::SourceLocation;
use thiserror::Error;

use crate::Element;

/// Deepest element nesting accepted in a document.
pub const MAX_NESTING: u32 = 512;

/// Parse error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("unexpected end of document at {0}")]
    UnexpectedEof(SourceLocation),

    #[error("expected {expected} at {location}, found '{found}'")]
    Expected {
        expected: &'static str,
        found: char,
        location: SourceLocation,
    },

    #[error("closing tag '</{found}>' at {location} does not match '<{expected}>'")]
    MismatchedTag {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("attribute '{name}' repeated at {location}")]
    DuplicateAttribute {
        name: String,
        location: SourceLocation,
    },

    #[error("unknown entity '&{entity};' at {location}")]
    UnknownEntity {
        entity: String,
        location: SourceLocation,
    },

    #[error("elements nested too deeply at {0}")]
    TooDeep(SourceLocation),

    #[error("document has no root element")]
    Empty,

    #[error("content after the root element at {0}")]
    TrailingContent(SourceLocation),
}

/// Parse a document and return its root element.
///
/// # Errors
///
/// Returns `DocumentError` if the document is malformed.
pub fn parse_document(input: &str) -> Result<Element, DocumentError> {
    let mut parser = Parser::new(input);
    parser.parse()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn parse(&mut self) -> Result<Element, DocumentError> {
        self.skip_misc()?;
        if self.check_str("<?") {
            self.skip_until("?>")?;
            self.skip_misc()?;
        }
        if self.is_eof() {
            return Err(DocumentError::Empty);
        }

        let root = self.parse_element()?;

        self.skip_misc()?;
        if !self.is_eof() {
            return Err(DocumentError::TrailingContent(self.location()));
        }
        Ok(root)
    }

    /// Skip whitespace and comments.
    fn skip_misc(&mut self) -> Result<(), DocumentError> {
        loop {
            self.skip_whitespace();
            if self.check_str("<!--") {
                self.skip_until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element, DocumentError> {
        let location = self.location();
        if self.depth >= MAX_NESTING {
            return Err(DocumentError::TooDeep(location));
        }
        self.expect('<', "'<'")?;
        let tag = self.parse_name()?;
        let mut element = Element::new(tag, location);

        // Attributes
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('/') => {
                    self.advance();
                    self.expect('>', "'>'")?;
                    return Ok(element);
                }
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    let attr_location = self.location();
                    let name = self.parse_name()?;
                    self.skip_whitespace();
                    self.expect('=', "'='")?;
                    self.skip_whitespace();
                    let value = self.parse_quoted()?;
                    if element.attribute(&name).is_some() {
                        return Err(DocumentError::DuplicateAttribute {
                            name,
                            location: attr_location,
                        });
                    }
                    element.attributes.push((name, value));
                }
                None => return Err(self.eof()),
            }
        }

        // Content
        loop {
            if self.check_str("<!--") {
                self.skip_until("-->")?;
            } else if self.check_str("</") {
                let close_location = self.location();
                self.advance();
                self.advance();
                let name = self.parse_name()?;
                self.skip_whitespace();
                self.expect('>', "'>'")?;
                if name != element.tag {
                    return Err(DocumentError::MismatchedTag {
                        expected: element.tag,
                        found: name,
                        location: close_location,
                    });
                }
                element.text = element.text.trim().to_string();
                return Ok(element);
            } else if self.peek() == Some('<') {
                self.depth += 1;
                let child = self.parse_element()?;
                self.depth -= 1;
                element.children.push(child);
            } else if self.is_eof() {
                return Err(self.eof());
            } else {
                let text = self.parse_text()?;
                element.text.push_str(&text);
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, DocumentError> {
        let mut name = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return match self.peek() {
                Some(found) => Err(DocumentError::Expected {
                    expected: "name",
                    found,
                    location: self.location(),
                }),
                None => Err(self.eof()),
            };
        }

        Ok(name)
    }

    fn parse_quoted(&mut self) -> Result<String, DocumentError> {
        let quote = match self.peek() {
            Some(c @ ('"' | '\'')) => c,
            Some(found) => {
                return Err(DocumentError::Expected {
                    expected: "quoted value",
                    found,
                    location: self.location(),
                });
            }
            None => return Err(self.eof()),
        };
        self.advance();

        let mut value = String::new();
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(value);
                }
                Some('&') => value.push(self.parse_entity()?),
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => return Err(self.eof()),
            }
        }
    }

    fn parse_text(&mut self) -> Result<String, DocumentError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            match c {
                '<' => break,
                '&' => text.push(self.parse_entity()?),
                _ => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Ok(text)
    }

    fn parse_entity(&mut self) -> Result<char, DocumentError> {
        let location = self.location();
        self.expect('&', "'&'")?;
        let mut entity = String::new();
        loop {
            match self.peek() {
                Some(';') => {
                    self.advance();
                    break;
                }
                Some(c) if c.is_alphanumeric() || c == '#' => {
                    entity.push(c);
                    self.advance();
                }
                Some(found) => {
                    return Err(DocumentError::Expected {
                        expected: "';'",
                        found,
                        location: self.location(),
                    });
                }
                None => return Err(self.eof()),
            }
        }

        let decoded = match entity.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        decoded.ok_or(DocumentError::UnknownEntity { entity, location })
    }

    fn skip_until(&mut self, terminator: &str) -> Result<(), DocumentError> {
        while !self.check_str(terminator) {
            if self.is_eof() {
                return Err(self.eof());
            }
            self.advance();
        }
        for _ in terminator.chars() {
            self.advance();
        }
        Ok(())
    }

    fn expect(&mut self, expected: char, label: &'static str) -> Result<(), DocumentError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(found) => Err(DocumentError::Expected {
                expected: label,
                found,
                location: self.location(),
            }),
            None => Err(self.eof()),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn eof(&self) -> DocumentError {
        DocumentError::UnexpectedEof(self.location())
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn check_str(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn remaining(&self) -> &str {
        self.input.get(self.pos..).unwrap_or("")
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

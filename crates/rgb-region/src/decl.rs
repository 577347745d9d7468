//! The declaration interface regions are parsed from.
//!
//! The engine does not own a document model. Any tree that can answer
//! "what is your tag, what are your attributes, where are you in the file"
//! can feed the region parsers by implementing [`Declaration`].

use std::fmt;

/// 1-based line and column of a declaration in its source document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One element of an already-parsed map document.
pub trait Declaration {
    /// Element name, e.g. `cuboid` or `union`.
    fn tag(&self) -> &str;

    /// Raw attribute text, if the attribute is present.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Child elements in document order.
    fn children(&self) -> impl Iterator<Item = &Self>;

    fn location(&self) -> SourceLocation;

    /// Child elements with the given tag.
    fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Self>
    where
        Self: Sized,
    {
        self.children().filter(move |child| child.tag() == tag)
    }
}

/// An attribute value together with where it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    pub value: &'a str,
    pub location: SourceLocation,
}

/// Look up `name` on `node`. No validation is performed.
pub fn attribute<'a, D: Declaration>(node: &'a D, name: &'a str) -> Option<Attribute<'a>> {
    node.attribute(name).map(|value| Attribute {
        name,
        value,
        location: node.location(),
    })
}

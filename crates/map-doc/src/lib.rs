//! Map Document Reader
//!
//! Reads map files into a tree of [`Element`]s that remember where they were
//! declared, so region diagnostics can point at a line and column.
//!
//! # Examples
//!
//! ```
//! use map_doc::parse_document;
//!
//! let map = parse_document(r#"
//! <map>
//!     <regions>
//!         <cuboid id="spawn" min="0,60,0" max="8,70,8"/>
//!     </regions>
//! </map>
//! "#).unwrap();
//!
//! let regions = map.child("regions").unwrap();
//! assert_eq!(regions.children.len(), 1);
//! assert_eq!(regions.children[0].location.line, 4);
//! ```

mod parser;

pub use parser::{DocumentError, MAX_NESTING, parse_document};
use rgb_region::{Declaration, SourceLocation};

/// One element of a map document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Trimmed text content, empty for most elements.
    pub text: String,
    pub location: SourceLocation,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
            location,
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child with the given tag.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

impl Declaration for Element {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        Self::attribute(self, name)
    }

    fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.iter()
    }

    fn location(&self) -> SourceLocation {
        self.location
    }
}

//! Tag name to parser dispatch.

use rustc_hash::FxHashMap;

use crate::{
    decl::Declaration,
    diagnostic::{Diagnostic, DiagnosticKind},
    parse,
    shape::{Direction, Shape},
};

/// Parses one leaf declaration into a shape.
pub type ShapeParser<D> = fn(&D) -> Result<Shape, Diagnostic>;

/// Boolean and transform combinators over child regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    /// Any child contains the point.
    Union,
    /// Every child contains the point.
    Intersect,
    /// The single child does not contain the point.
    Complement,
    /// No child contains the point.
    Negative,
    /// The single child, shifted by an `offset` attribute.
    Translate,
}

impl CompositeKind {
    /// Exact child count this kind requires, if it is fixed.
    #[must_use]
    pub const fn fixed_arity(self) -> Option<usize> {
        match self {
            Self::Complement | Self::Translate => Some(1),
            Self::Union | Self::Intersect | Self::Negative => None,
        }
    }
}

/// What a declaration tag resolves to.
pub enum RegionParser<D> {
    Shape(ShapeParser<D>),
    Composite(CompositeKind),
}

impl<D> Clone for RegionParser<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for RegionParser<D> {}

/// Result of dispatching a declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatched {
    Shape(Shape),
    /// A composite; its own attributes and children are handled by the loader.
    Composite(CompositeKind),
}

/// Maps declaration tags to parsers.
///
/// [`ParserRegistry::default`] knows every built-in kind. Hosts can add
/// their own leaf shapes with [`ParserRegistry::register`] before loading.
pub struct ParserRegistry<D> {
    parsers: FxHashMap<String, RegionParser<D>>,
}

impl<D: Declaration> ParserRegistry<D> {
    /// A registry with no kinds at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: FxHashMap::default(),
        }
    }

    /// Register a leaf shape parser, replacing any previous parser for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, parser: ShapeParser<D>) -> &mut Self {
        self.parsers.insert(tag.into(), RegionParser::Shape(parser));
        self
    }

    pub fn register_composite(&mut self, tag: impl Into<String>, kind: CompositeKind) -> &mut Self {
        self.parsers.insert(tag.into(), RegionParser::Composite(kind));
        self
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<RegionParser<D>> {
        self.parsers.get(tag).copied()
    }

    #[must_use]
    pub fn is_registered(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    /// Parse `node` with the parser registered for its tag.
    pub fn dispatch(&self, node: &D) -> Result<Dispatched, Diagnostic> {
        match self.get(node.tag()) {
            Some(RegionParser::Shape(parse)) => parse(node).map(Dispatched::Shape),
            Some(RegionParser::Composite(kind)) => Ok(Dispatched::Composite(kind)),
            None => Err(Diagnostic::new(
                DiagnosticKind::UnknownRegionKind(node.tag().to_string()),
                node.location(),
            )),
        }
    }
}

impl<D: Declaration> Default for ParserRegistry<D> {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("cuboid", parse::cuboid)
            .register("block", parse::block)
            .register("sphere", parse::sphere)
            .register("cylinder", parse::cylinder)
            .register("half", parse::half)
            .register("rectangle", parse::rectangle)
            .register("circle", parse::circle)
            .register("everywhere", |_| Ok(Shape::Everywhere))
            .register("nowhere", |_| Ok(Shape::Nowhere))
            .register("below", |node| parse::half_space(node, Direction::Below))
            .register("above", |node| parse::half_space(node, Direction::Above))
            .register("north", |node| parse::half_space(node, Direction::North))
            .register("south", |node| parse::half_space(node, Direction::South))
            .register("west", |node| parse::half_space(node, Direction::West))
            .register("east", |node| parse::half_space(node, Direction::East))
            .register_composite("union", CompositeKind::Union)
            .register_composite("intersect", CompositeKind::Intersect)
            .register_composite("intersection", CompositeKind::Intersect)
            .register_composite("complement", CompositeKind::Complement)
            .register_composite("negative", CompositeKind::Negative)
            .register_composite("translate", CompositeKind::Translate);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::test_node::Node;
    use crate::vec3::Vec3;

    #[test]
    fn test_every_direction_is_registered() {
        let registry = ParserRegistry::<Node>::default();
        for direction in Direction::ALL {
            assert!(registry.is_registered(direction.tag()));
        }
    }

    #[test]
    fn test_unknown_tag() {
        let registry = ParserRegistry::<Node>::default();
        let node = Node::new("pyramid").at(3, 4);
        let err = registry.dispatch(&node).unwrap_err();
        assert_eq!(
            err.kind,
            DiagnosticKind::UnknownRegionKind("pyramid".to_string())
        );
    }

    #[test]
    fn test_dispatch_routes_by_tag() {
        let registry = ParserRegistry::<Node>::default();

        let below = Node::new("below").attr("x", "0").attr("y", "5").attr("z", "0");
        assert_eq!(
            registry.dispatch(&below).unwrap(),
            Dispatched::Shape(Shape::HalfSpace {
                direction: Direction::Below,
                origin: Vec3::new(0.0, 5.0, 0.0),
            })
        );

        let alias = Node::new("intersection");
        assert_eq!(
            registry.dispatch(&alias).unwrap(),
            Dispatched::Composite(CompositeKind::Intersect)
        );
    }

    #[test]
    fn test_custom_kind() {
        let mut registry = ParserRegistry::<Node>::empty();
        registry.register("void", |_| Ok(Shape::Nowhere));

        assert!(registry.dispatch(&Node::new("void")).is_ok());
        assert!(registry.dispatch(&Node::new("cuboid")).is_err());
    }
}

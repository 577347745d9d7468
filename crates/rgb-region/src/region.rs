//! Resolved region nodes and the containment evaluator.

use std::fmt;

use smallvec::SmallVec;

use crate::{
    shape::Shape,
    vec3::{Aabb, Vec3},
};

/// Position of a region inside its registry.
///
/// Anonymous regions (declared inline inside another declaration) are only
/// reachable through their index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionIndex(u32);

impl RegionIndex {
    #[must_use]
    pub(crate) const fn from_usize(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RegionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionIndex({})", self.0)
    }
}

pub(crate) type Children = SmallVec<[RegionIndex; 4]>;

/// A fully resolved region. Composites point at other nodes of the same arena.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Shape(Shape),
    Union(Children),
    Intersect(Children),
    Complement(RegionIndex),
    Negative(Children),
    Translate { offset: Vec3, child: RegionIndex },
    /// A composite whose references could not be resolved.
    Unusable,
}

/// Point-in-region test over the arena.
///
/// Recursion depth is bounded by the loader, which rejects composites nested
/// deeper than [`crate::MAX_REGION_DEPTH`]. A region referenced by id from
/// several children of one composite is evaluated once per reference, so a
/// miss costs one visit per path through the composite tree.
pub(crate) fn contains(nodes: &[Node], index: RegionIndex, p: Vec3) -> bool {
    match &nodes[index.as_usize()] {
        Node::Shape(shape) => shape.contains(p),
        Node::Union(children) => children.iter().any(|&c| contains(nodes, c, p)),
        Node::Intersect(children) => children.iter().all(|&c| contains(nodes, c, p)),
        Node::Complement(child) => !contains(nodes, *child, p),
        Node::Negative(children) => !children.iter().any(|&c| contains(nodes, c, p)),
        Node::Translate { offset, child } => contains(nodes, *child, p - *offset),
        Node::Unusable => false,
    }
}

/// Bounding box of every node, each computed once from its children's boxes.
///
/// Shared children are visited a single time. A child still being visited
/// (only possible for a cycle, which the loader never publishes) counts as
/// unbounded.
pub(crate) fn bounding_boxes(nodes: &[Node]) -> Box<[Option<Aabb>]> {
    let mut bounds: Vec<Option<Aabb>> = vec![None; nodes.len()];
    let mut done = vec![false; nodes.len()];
    let mut entered = vec![false; nodes.len()];
    // (node, children already pushed)
    let mut stack: Vec<(usize, bool)> = Vec::new();

    for root in 0..nodes.len() {
        stack.push((root, false));
        while let Some((index, expanded)) = stack.pop() {
            if expanded {
                let child = |c: RegionIndex| {
                    let c = c.as_usize();
                    if done[c] { bounds[c] } else { None }
                };
                let value = node_bounds(&nodes[index], child);
                bounds[index] = value;
                done[index] = true;
                continue;
            }
            if entered[index] {
                continue;
            }
            entered[index] = true;
            stack.push((index, true));
            stack.extend(
                children(&nodes[index])
                    .iter()
                    .filter(|c| !entered[c.as_usize()])
                    .map(|c| (c.as_usize(), false)),
            );
        }
    }
    bounds.into_boxed_slice()
}

fn children(node: &Node) -> &[RegionIndex] {
    match node {
        Node::Union(children) | Node::Intersect(children) | Node::Negative(children) => {
            children.as_slice()
        }
        Node::Complement(child) | Node::Translate { child, .. } => std::slice::from_ref(child),
        Node::Shape(_) | Node::Unusable => &[],
    }
}

fn node_bounds(node: &Node, child: impl Fn(RegionIndex) -> Option<Aabb>) -> Option<Aabb> {
    match node {
        Node::Shape(shape) => shape.bounding_box(),
        Node::Union(children) => children
            .iter()
            .try_fold(Aabb::EMPTY, |acc, &c| child(c).map(|b| acc.union(b))),
        Node::Intersect(children) => {
            let everything = Aabb {
                min: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                max: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            };
            children
                .iter()
                .try_fold(everything, |acc, &c| child(c).map(|b| acc.intersection(b)))
        }
        Node::Complement(_) | Node::Negative(_) => None,
        Node::Translate { offset, child: c } => child(*c).map(|b| b.translate(*offset)),
        Node::Unusable => Some(Aabb::EMPTY),
    }
}

/// Borrowed handle to one region of a published registry.
#[derive(Clone, Copy)]
pub struct Region<'r> {
    nodes: &'r [Node],
    bounds: &'r [Option<Aabb>],
    index: RegionIndex,
    id: Option<&'r str>,
}

impl<'r> Region<'r> {
    pub(crate) fn new(
        nodes: &'r [Node],
        bounds: &'r [Option<Aabb>],
        index: RegionIndex,
        id: Option<&'r str>,
    ) -> Self {
        Self {
            nodes,
            bounds,
            index,
            id,
        }
    }

    #[must_use]
    pub fn index(&self) -> RegionIndex {
        self.index
    }

    /// The declared id, or `None` for an anonymous region.
    #[must_use]
    pub fn id(&self) -> Option<&'r str> {
        self.id
    }

    /// Whether `p` lies inside this region.
    ///
    /// Never fails: a region that could not be resolved contains nothing.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        contains(self.nodes, self.index, p)
    }

    /// Coarse bounds for pruning before [`Region::contains`].
    ///
    /// `None` means the region is unbounded (or depends on an unbounded
    /// region). The box may be empty for regions that contain nothing.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        self.bounds[self.index.as_usize()]
    }

    /// The leaf geometry, if this is not a composite.
    #[must_use]
    pub fn shape(&self) -> Option<&'r Shape> {
        match &self.nodes[self.index.as_usize()] {
            Node::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    /// False for composites whose references failed to resolve.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !matches!(self.nodes[self.index.as_usize()], Node::Unusable)
    }
}

impl fmt::Debug for Region<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("node", &self.nodes[self.index.as_usize()])
            .finish()
    }
}

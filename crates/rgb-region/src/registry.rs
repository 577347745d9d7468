//! Per-map region registry.
//!
//! Loading happens in two passes:
//!
//! 1. [`RegionLoader::declare`] parses declarations in document order. Leaf
//!    shapes are final immediately; composites are recorded with their child
//!    references, which may point forwards to ids not declared yet.
//! 2. [`RegionLoader::finish`] walks every composite depth-first with an
//!    explicit stack, binds references to arena indices, reports missing ids
//!    and cycles, and publishes an immutable [`RegionRegistry`].
//!
//! A failed declaration never aborts the load. It is recorded as a
//! diagnostic and the region is either absent (parse failures) or present
//! but empty (resolution failures).

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::{
    MAX_REGION_DEPTH,
    decl::{Declaration, SourceLocation, attribute},
    diagnostic::{Diagnostic, DiagnosticKind, Diagnostics},
    parse,
    parser_registry::{CompositeKind, Dispatched, ParserRegistry},
    region::{self, Children, Node, Region, RegionIndex},
    shape::Shape,
    vec3::{Aabb, Vec3},
};

/// Tag of a by-id reference inside a composite: `<region id="spawn"/>`.
pub const REFERENCE_TAG: &str = "region";

enum ChildRef {
    Id {
        id: String,
        location: SourceLocation,
    },
    Inline(RegionIndex),
}

struct Pending {
    kind: CompositeKind,
    offset: Vec3,
    children: Vec<ChildRef>,
    /// An inline child or reference failed to parse.
    broken: bool,
}

struct Entry {
    id: Option<String>,
    tag: String,
    location: SourceLocation,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Mutable construction state for one map's regions.
///
/// Nothing is queryable until [`RegionLoader::finish`] returns the
/// published registry.
pub struct RegionLoader<D> {
    parsers: ParserRegistry<D>,
    nodes: Vec<Node>,
    pending: Vec<Option<Pending>>,
    entries: Vec<Entry>,
    ids: FxHashMap<String, RegionIndex>,
    diagnostics: Diagnostics,
    /// Composites enclosing the declaration being parsed.
    nesting: u32,
}

impl<D: Declaration> Default for RegionLoader<D> {
    fn default() -> Self {
        Self::with_parsers(ParserRegistry::default())
    }
}

impl<D: Declaration> RegionLoader<D> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parsers(parsers: ParserRegistry<D>) -> Self {
        Self {
            parsers,
            nodes: Vec::new(),
            pending: Vec::new(),
            entries: Vec::new(),
            ids: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
            nesting: 0,
        }
    }

    /// Parse one region declaration.
    ///
    /// Returns the new region's index, or `None` if the declaration was
    /// rejected (the reason is recorded as a diagnostic). The index stays
    /// valid in the published registry, which lets callers keep anonymous
    /// regions declared inline in their own configuration.
    pub fn declare(&mut self, node: &D) -> Option<RegionIndex> {
        match self.try_declare(node) {
            Ok(index) => Some(index),
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                None
            }
        }
    }

    /// Declare every node in order.
    pub fn declare_all<'a>(&mut self, nodes: impl IntoIterator<Item = &'a D>)
    where
        D: 'a,
    {
        for node in nodes {
            self.declare(node);
        }
    }

    fn try_declare(&mut self, node: &D) -> Result<RegionIndex, Diagnostic> {
        if self.nesting > MAX_REGION_DEPTH {
            // Children of a rejected node are never visited.
            let label = match attribute(node, "id") {
                Some(attr) => attr.value.to_string(),
                None => format!("<{}> at {}", node.tag(), node.location()),
            };
            return Err(Diagnostic::new(
                DiagnosticKind::RegionTooDeep(label),
                node.location(),
            ));
        }

        let id = match attribute(node, "id") {
            Some(attr) if attr.value.trim().is_empty() => {
                return Err(Diagnostic::new(
                    DiagnosticKind::invalid(attr.name, attr.value),
                    attr.location,
                ));
            }
            Some(attr) => Some(attr.value),
            None => None,
        };
        if let Some(id) = id {
            if self.ids.contains_key(id) {
                return Err(Diagnostic::new(
                    DiagnosticKind::DuplicateRegionId(id.to_string()),
                    node.location(),
                ));
            }
        }

        let pending = match self.parsers.dispatch(node)? {
            Dispatched::Shape(shape) => {
                return Ok(self.push(node, id, Node::Shape(shape)));
            }
            Dispatched::Composite(kind) => self.composite_header(node, kind)?,
        };

        let index = self.push(node, id, Node::Unusable);
        self.nesting += 1;
        let pending = self.composite_children(node, pending);
        self.nesting -= 1;
        self.pending[index.as_usize()] = Some(pending);
        Ok(index)
    }

    /// Validate a composite's own attributes and child count.
    fn composite_header(&mut self, node: &D, kind: CompositeKind) -> Result<Pending, Diagnostic> {
        let offset = match kind {
            CompositeKind::Translate => parse::finite_vec3_attr(node, "offset")?,
            _ => Vec3::ZERO,
        };

        let found = node.children().count();
        if let Some(expected) = kind.fixed_arity() {
            if found != expected {
                return Err(Diagnostic::new(
                    DiagnosticKind::WrongChildCount {
                        tag: node.tag().to_string(),
                        expected,
                        found,
                    },
                    node.location(),
                ));
            }
        }
        if found == 0 {
            self.diagnostics.report(
                DiagnosticKind::EmptyComposite(node.tag().to_string()),
                node.location(),
            );
        }

        Ok(Pending {
            kind,
            offset,
            children: Vec::with_capacity(found),
            broken: false,
        })
    }

    fn composite_children(&mut self, node: &D, mut pending: Pending) -> Pending {
        for child in node.children() {
            if child.tag() == REFERENCE_TAG {
                match parse::required(child, "id") {
                    Ok(attr) => pending.children.push(ChildRef::Id {
                        id: attr.value.to_string(),
                        location: attr.location,
                    }),
                    Err(diagnostic) => {
                        self.diagnostics.push(diagnostic);
                        pending.broken = true;
                    }
                }
            } else {
                match self.declare(child) {
                    Some(index) => pending.children.push(ChildRef::Inline(index)),
                    None => pending.broken = true,
                }
            }
        }
        pending
    }

    fn push(&mut self, node: &D, id: Option<&str>, value: Node) -> RegionIndex {
        let index = RegionIndex::from_usize(self.nodes.len());
        if let Some(id) = id {
            self.ids.insert(id.to_string(), index);
        }
        self.nodes.push(value);
        self.pending.push(None);
        self.entries.push(Entry {
            id: id.map(str::to_string),
            tag: node.tag().to_string(),
            location: node.location(),
        });
        index
    }

    /// Human-readable name for diagnostics about region `index`.
    fn label(&self, index: usize) -> String {
        let entry = &self.entries[index];
        match &entry.id {
            Some(id) => id.clone(),
            None => format!("<{}> at {}", entry.tag, entry.location),
        }
    }

    /// Resolve every composite and publish the registry.
    #[must_use]
    pub fn finish(mut self) -> RegionRegistry {
        let composites = self.resolve();

        let named = self.ids.len();
        let total = self.nodes.len();
        info!(
            "Loaded {} region(s) ({} named, {} composite) with {} diagnostic(s)",
            total,
            named,
            composites,
            self.diagnostics.len()
        );
        if self.diagnostics.has_errors() {
            warn!("Some region declarations failed; affected regions are disabled");
        }

        let bounds = region::bounding_boxes(&self.nodes);
        RegionRegistry {
            nodes: self.nodes.into_boxed_slice(),
            bounds,
            names: self.entries.into_iter().map(|e| e.id).collect(),
            ids: self.ids,
            diagnostics: self.diagnostics,
        }
    }

    /// Bind composite references in dependency order. Returns the number of
    /// composites processed.
    fn resolve(&mut self) -> usize {
        let len = self.nodes.len();
        let mut marks: Vec<Mark> = self
            .pending
            .iter()
            .map(|p| if p.is_some() { Mark::Unvisited } else { Mark::Done })
            .collect();
        let mut failed = vec![false; len];
        let mut in_cycle = vec![false; len];
        let mut depth = vec![0_u32; len];
        let mut resolved: Vec<Children> = vec![Children::new(); len];
        // (region, next child to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..len {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::InProgress;
            stack.push((root, 0));

            while let Some(&(current, next)) = stack.last() {
                let child = self.pending[current]
                    .as_ref()
                    .and_then(|p| p.children.get(next));

                let Some(child) = child else {
                    stack.pop();
                    self.settle(current, &resolved, &mut failed, &mut depth);
                    marks[current] = Mark::Done;
                    continue;
                };

                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                let target = match child {
                    ChildRef::Inline(index) => index.as_usize(),
                    ChildRef::Id { id, location } => match self.ids.get(id) {
                        Some(index) => index.as_usize(),
                        None => {
                            self.diagnostics.report(
                                DiagnosticKind::UnknownRegionReference(id.clone()),
                                *location,
                            );
                            failed[current] = true;
                            continue;
                        }
                    },
                };
                resolved[current].push(RegionIndex::from_usize(target));

                match marks[target] {
                    Mark::Unvisited => {
                        marks[target] = Mark::InProgress;
                        stack.push((target, 0));
                    }
                    Mark::InProgress => {
                        self.report_cycle(&stack, target, &mut failed, &mut in_cycle);
                    }
                    Mark::Done => {}
                }
            }
        }

        let mut composites = 0;
        for (index, slot) in self.pending.iter_mut().enumerate() {
            let Some(pending) = slot.take() else {
                continue;
            };
            composites += 1;
            let children = std::mem::take(&mut resolved[index]);
            self.nodes[index] = if failed[index] {
                Node::Unusable
            } else {
                build(pending.kind, pending.offset, children)
            };
        }
        debug!("Resolved {} composite region(s)", composites);
        composites
    }

    /// Record the cycle closed by an edge back to `target`, which is on the
    /// stack, and mark every region on it as failed.
    fn report_cycle(
        &mut self,
        stack: &[(usize, usize)],
        target: usize,
        failed: &mut [bool],
        in_cycle: &mut [bool],
    ) {
        let start = stack
            .iter()
            .position(|&(index, _)| index == target)
            .unwrap_or(0);
        let members = &stack[start..];
        if members.iter().all(|&(index, _)| in_cycle[index]) {
            // Same cycle reached through another edge.
            return;
        }

        let mut chain: Vec<String> = members.iter().map(|&(index, _)| self.label(index)).collect();
        chain.push(self.label(target));
        for &(index, _) in members {
            failed[index] = true;
            in_cycle[index] = true;
        }
        self.diagnostics.report(
            DiagnosticKind::CyclicRegionReference(chain),
            self.entries[target].location,
        );
    }

    /// Decide whether a composite whose children are all visited is usable.
    fn settle(&mut self, index: usize, resolved: &[Children], failed: &mut [bool], depth: &mut [u32]) {
        let children = &resolved[index];
        let broken = self.pending[index].as_ref().is_some_and(|p| p.broken);
        let child_failed = children.iter().any(|c| failed[c.as_usize()]);
        let own_depth = 1 + children
            .iter()
            .map(|c| depth[c.as_usize()])
            .max()
            .unwrap_or(0);
        depth[index] = own_depth;

        if failed[index] || broken || child_failed {
            failed[index] = true;
        } else if own_depth > MAX_REGION_DEPTH {
            let label = self.label(index);
            self.diagnostics.report(
                DiagnosticKind::RegionTooDeep(label),
                self.entries[index].location,
            );
            failed[index] = true;
        }
    }
}

fn build(kind: CompositeKind, offset: Vec3, children: Children) -> Node {
    if children.is_empty() {
        return Node::Shape(Shape::Nowhere);
    }
    match kind {
        CompositeKind::Union => Node::Union(children),
        CompositeKind::Intersect => Node::Intersect(children),
        CompositeKind::Negative => Node::Negative(children),
        CompositeKind::Complement => Node::Complement(children[0]),
        CompositeKind::Translate => Node::Translate {
            offset,
            child: children[0],
        },
    }
}

/// The immutable regions of one loaded map.
///
/// Shared read-only for the lifetime of a match (wrap it in an `Arc` to hand
/// it to several gameplay modules); drop it when the map unloads.
#[derive(Debug)]
pub struct RegionRegistry {
    nodes: Box<[Node]>,
    bounds: Box<[Option<Aabb>]>,
    names: Box<[Option<String>]>,
    ids: FxHashMap<String, RegionIndex>,
    diagnostics: Diagnostics,
}

impl RegionRegistry {
    /// Load a list of region declarations with the built-in parsers.
    pub fn load<'a, D: Declaration + 'a>(declarations: impl IntoIterator<Item = &'a D>) -> Self {
        let mut loader = RegionLoader::new();
        loader.declare_all(declarations);
        loader.finish()
    }

    /// Look up a named region.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Region<'_>> {
        self.ids.get(id).map(|&index| self.region(index))
    }

    /// Look up any region, named or anonymous, by index.
    #[must_use]
    pub fn get(&self, index: RegionIndex) -> Option<Region<'_>> {
        (index.as_usize() < self.nodes.len()).then(|| self.region(index))
    }

    /// `lookup(id)` followed by `contains(p)`; an absent region contains nothing.
    #[must_use]
    pub fn contains(&self, id: &str, p: Vec3) -> bool {
        self.ids
            .get(id)
            .is_some_and(|&index| region::contains(&self.nodes, index, p))
    }

    /// Named regions in declaration order.
    pub fn regions(&self) -> impl Iterator<Item = Region<'_>> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.is_some())
            .map(|(index, _)| self.region(RegionIndex::from_usize(index)))
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// True if any diagnostic has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Total number of regions, including anonymous ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn region(&self, index: RegionIndex) -> Region<'_> {
        Region::new(
            &self.nodes,
            &self.bounds,
            index,
            self.names[index.as_usize()].as_deref(),
        )
    }
}

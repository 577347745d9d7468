//! Map regions for RGB game servers.
//!
//! Maps declare named volumes (spawn zones, objective areas, restricted
//! zones) in a small declarative language. This crate parses those
//! declarations once per map load, resolves composite regions that refer to
//! each other by id, and answers "is this point inside region X" for the
//! rest of the match.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   dispatch by tag   ┌────────────────┐
//! │ Declaration  │ ──────────────────▶ │ ParserRegistry │──▶ Shape / composite
//! └──────────────┘                     └────────────────┘
//!         │                                     │
//!         ▼                                     ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ RegionLoader: leaf pass, then DFS resolution pass    │
//! │   (missing ids, cycles, depth limit → Diagnostics)   │
//! └──────────────────────────────────────────────────────┘
//!                           │ finish()
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ RegionRegistry (immutable, Send + Sync)              │
//! │   lookup(id) → Region → contains(p) / bounding_box() │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use rgb_region::{RegionRegistry, Vec3};
//!
//! let registry = RegionRegistry::load(regions_element.children());
//! for diagnostic in registry.diagnostics() {
//!     eprintln!("{diagnostic}");
//! }
//!
//! if let Some(spawn) = registry.lookup("red-spawn") {
//!     let inside = spawn.contains(Vec3::new(12.5, 64.0, -3.0));
//! }
//! ```

mod decl;
mod diagnostic;
pub mod parse;
mod parser_registry;
mod region;
mod registry;
mod shape;
mod vec3;

pub use decl::{Attribute, Declaration, SourceLocation, attribute};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use parser_registry::{CompositeKind, Dispatched, ParserRegistry, RegionParser, ShapeParser};
pub use region::{Region, RegionIndex};
pub use registry::{REFERENCE_TAG, RegionLoader, RegionRegistry};
pub use shape::{Direction, Shape};
pub use vec3::{Aabb, Vec3};

/// Deepest composite nesting accepted by the loader.
///
/// Loading inline children and answering containment both recurse once per
/// level, so this bounds the stack use of either.
pub const MAX_REGION_DEPTH: u32 = 256;

//! Leaf region geometry.
//!
//! Bounded shapes treat their surface as inside: a point exactly on a cuboid
//! face, sphere surface or cylinder cap is contained. Directional
//! half-spaces are open and exclude their boundary plane.

use crate::vec3::{Aabb, Vec3};

/// Axis-aligned direction of a half-space, in Minecraft compass terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `y` below the reference.
    Below,
    /// `y` above the reference.
    Above,
    /// `z` less than the reference.
    North,
    /// `z` greater than the reference.
    South,
    /// `x` less than the reference.
    West,
    /// `x` greater than the reference.
    East,
}

impl Direction {
    pub const ALL: [Self; 6] = [
        Self::Below,
        Self::Above,
        Self::North,
        Self::South,
        Self::West,
        Self::East,
    ];

    /// Declaration tag for this direction.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Below => "below",
            Self::Above => "above",
            Self::North => "north",
            Self::South => "south",
            Self::West => "west",
            Self::East => "east",
        }
    }

    #[must_use]
    fn admits(self, p: Vec3, origin: Vec3) -> bool {
        match self {
            Self::Below => p.y < origin.y,
            Self::Above => p.y > origin.y,
            Self::North => p.z < origin.z,
            Self::South => p.z > origin.z,
            Self::West => p.x < origin.x,
            Self::East => p.x > origin.x,
        }
    }
}

/// An immutable leaf region.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Cuboid(Aabb),
    Sphere {
        origin: Vec3,
        radius: f64,
    },
    /// Vertical cylinder standing on `base`. `height` is never negative.
    Cylinder {
        base: Vec3,
        radius: f64,
        height: f64,
    },
    HalfSpace {
        direction: Direction,
        origin: Vec3,
    },
    /// Arbitrary plane through `origin`; `normal` points into the region.
    Half {
        origin: Vec3,
        normal: Vec3,
    },
    /// Infinite column over an x/z rectangle.
    Rectangle {
        min_x: f64,
        min_z: f64,
        max_x: f64,
        max_z: f64,
    },
    /// Infinite column over an x/z disc.
    Circle {
        center_x: f64,
        center_z: f64,
        radius: f64,
    },
    Everywhere,
    Nowhere,
}

impl Shape {
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        match *self {
            Self::Cuboid(bounds) => bounds.contains(p),
            Self::Sphere { origin, radius } => {
                let d = p - origin;
                d.dot(d) <= radius * radius
            }
            Self::Cylinder {
                base,
                radius,
                height,
            } => {
                let dx = p.x - base.x;
                let dz = p.z - base.z;
                p.y >= base.y
                    && p.y <= base.y + height
                    && dx.mul_add(dx, dz * dz) <= radius * radius
            }
            Self::HalfSpace { direction, origin } => direction.admits(p, origin),
            Self::Half { origin, normal } => (p - origin).dot(normal) >= 0.0,
            Self::Rectangle {
                min_x,
                min_z,
                max_x,
                max_z,
            } => p.x >= min_x && p.x <= max_x && p.z >= min_z && p.z <= max_z,
            Self::Circle {
                center_x,
                center_z,
                radius,
            } => {
                let dx = p.x - center_x;
                let dz = p.z - center_z;
                dx.mul_add(dx, dz * dz) <= radius * radius
            }
            Self::Everywhere => true,
            Self::Nowhere => false,
        }
    }

    /// Finite bounds, or `None` when the shape extends to infinity.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        let bounds = match *self {
            Self::Cuboid(bounds) => bounds,
            Self::Sphere { origin, radius } => {
                let r = Vec3::new(radius, radius, radius);
                Aabb {
                    min: origin - r,
                    max: origin + r,
                }
            }
            Self::Cylinder {
                base,
                radius,
                height,
            } => Aabb {
                min: Vec3::new(base.x - radius, base.y, base.z - radius),
                max: Vec3::new(base.x + radius, base.y + height, base.z + radius),
            },
            Self::Nowhere => return Some(Aabb::EMPTY),
            Self::HalfSpace { .. }
            | Self::Half { .. }
            | Self::Rectangle { .. }
            | Self::Circle { .. }
            | Self::Everywhere => return None,
        };
        bounds.is_finite().then_some(bounds)
    }

    /// True if the shape has no finite bounding box.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.bounding_box().is_none()
    }
}

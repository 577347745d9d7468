//! Attribute parsing and the built-in leaf shape parsers.
//!
//! Every parser reads its attributes in a fixed order and stops at the first
//! missing or malformed one, so a declaration yields at most one diagnostic.

use crate::{
    decl::{Attribute, Declaration, attribute},
    diagnostic::{Diagnostic, DiagnosticKind},
    shape::{Direction, Shape},
    vec3::{Aabb, Vec3},
};

/// Parse a single number. Accepts `oo`, `+oo` and `-oo` for infinity; rejects NaN.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let value = match raw {
        "oo" | "+oo" => f64::INFINITY,
        "-oo" => f64::NEG_INFINITY,
        _ => raw.parse::<f64>().ok()?,
    };
    (!value.is_nan()).then_some(value)
}

/// Parse `N` comma-separated numbers, optionally wrapped in parentheses.
fn parse_components<const N: usize>(raw: &str) -> Option<[f64; N]> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(raw);

    let mut out = [0.0; N];
    let mut parts = raw.split(',');
    for slot in &mut out {
        *slot = parse_number(parts.next()?)?;
    }
    parts.next().is_none().then_some(out)
}

/// Parse an `x,y,z` vector.
#[must_use]
pub fn parse_vec3(raw: &str) -> Option<Vec3> {
    parse_components::<3>(raw).map(Vec3::from)
}

/// Parse an `x,z` pair.
#[must_use]
pub fn parse_vec2(raw: &str) -> Option<(f64, f64)> {
    parse_components::<2>(raw).map(|[x, z]| (x, z))
}

/// Fetch a required attribute or report it missing.
pub fn required<'a, D: Declaration>(
    node: &'a D,
    name: &'a str,
) -> Result<Attribute<'a>, Diagnostic> {
    attribute(node, name)
        .ok_or_else(|| Diagnostic::new(DiagnosticKind::missing(name), node.location()))
}

fn invalid(attr: &Attribute<'_>) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::invalid(attr.name, attr.value),
        attr.location,
    )
}

fn with_parser<'a, D: Declaration, T>(
    node: &'a D,
    name: &'a str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, Diagnostic> {
    let attr = required(node, name)?;
    parse(attr.value).ok_or_else(|| invalid(&attr))
}

pub fn number_attr<D: Declaration>(node: &D, name: &str) -> Result<f64, Diagnostic> {
    with_parser(node, name, parse_number)
}

pub fn vec3_attr<D: Declaration>(node: &D, name: &str) -> Result<Vec3, Diagnostic> {
    with_parser(node, name, parse_vec3)
}

/// A finite vector, e.g. an offset or a sphere origin.
pub fn finite_vec3_attr<D: Declaration>(node: &D, name: &str) -> Result<Vec3, Diagnostic> {
    with_parser(node, name, |raw| parse_vec3(raw).filter(|v| v.is_finite()))
}

fn vec2_attr<D: Declaration>(node: &D, name: &str) -> Result<(f64, f64), Diagnostic> {
    with_parser(node, name, parse_vec2)
}

fn radius_attr<D: Declaration>(node: &D, name: &str) -> Result<f64, Diagnostic> {
    with_parser(node, name, |raw| {
        parse_number(raw).filter(|r| r.is_finite() && *r >= 0.0)
    })
}

/// `<cuboid min="x,y,z" max="x,y,z"/>`
pub fn cuboid<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let min = vec3_attr(node, "min")?;
    let max = vec3_attr(node, "max")?;
    Ok(Shape::Cuboid(Aabb::from_corners(min, max)))
}

/// `<block location="x,y,z"/>`: the unit cube of the block containing `location`.
pub fn block<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let corner = finite_vec3_attr(node, "location")?.floor();
    Ok(Shape::Cuboid(Aabb::from_corners(corner, corner + Vec3::ONE)))
}

/// `<sphere origin="x,y,z" radius="r"/>`
pub fn sphere<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let origin = finite_vec3_attr(node, "origin")?;
    let radius = radius_attr(node, "radius")?;
    Ok(Shape::Sphere { origin, radius })
}

/// `<cylinder base="x,y,z" radius="r" height="h"/>`. A negative height extends downwards.
pub fn cylinder<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let mut base = finite_vec3_attr(node, "base")?;
    let radius = radius_attr(node, "radius")?;
    let mut height = with_parser(node, "height", |raw| {
        parse_number(raw).filter(|h| h.is_finite())
    })?;
    if height < 0.0 {
        base.y += height;
        height = -height;
    }
    Ok(Shape::Cylinder {
        base,
        radius,
        height,
    })
}

/// `<below x=".." y=".." z=".."/>` and its siblings.
///
/// All three coordinates are required and checked in x, y, z order; only the
/// axis named by `direction` constrains containment.
pub fn half_space<D: Declaration>(node: &D, direction: Direction) -> Result<Shape, Diagnostic> {
    let x = number_attr(node, "x")?;
    let y = number_attr(node, "y")?;
    let z = number_attr(node, "z")?;
    Ok(Shape::HalfSpace {
        direction,
        origin: Vec3::new(x, y, z),
    })
}

/// `<half origin="x,y,z" normal="x,y,z"/>`
pub fn half<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let origin = finite_vec3_attr(node, "origin")?;
    let normal = with_parser(node, "normal", |raw| {
        parse_vec3(raw).filter(|n| n.is_finite() && !n.is_zero())
    })?;
    Ok(Shape::Half { origin, normal })
}

/// `<rectangle min="x,z" max="x,z"/>`
pub fn rectangle<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let (ax, az) = vec2_attr(node, "min")?;
    let (bx, bz) = vec2_attr(node, "max")?;
    Ok(Shape::Rectangle {
        min_x: ax.min(bx),
        min_z: az.min(bz),
        max_x: ax.max(bx),
        max_z: az.max(bz),
    })
}

/// `<circle center="x,z" radius="r"/>`
pub fn circle<D: Declaration>(node: &D) -> Result<Shape, Diagnostic> {
    let (center_x, center_z) = with_parser(node, "center", |raw| {
        parse_vec2(raw).filter(|(x, z)| x.is_finite() && z.is_finite())
    })?;
    let radius = radius_attr(node, "radius")?;
    Ok(Shape::Circle {
        center_x,
        center_z,
        radius,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use crate::decl::{SourceLocation, test_node::Node};

    #[test]
    fn test_number_grammar() {
        assert_eq!(parse_number("1.5"), Some(1.5));
        assert_eq!(parse_number(" -3 "), Some(-3.0));
        assert_eq!(parse_number("oo"), Some(f64::INFINITY));
        assert_eq!(parse_number("-oo"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_vector_grammar() {
        assert_eq!(parse_vec3("1,2,3"), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(parse_vec3("(5, 5, 5)"), Some(Vec3::new(5.0, 5.0, 5.0)));
        assert_eq!(parse_vec3("1,2"), None);
        assert_eq!(parse_vec3("1,2,3,4"), None);
        assert_eq!(parse_vec3("1,,3"), None);
        assert_eq!(parse_vec2("-oo, 4"), Some((f64::NEG_INFINITY, 4.0)));
    }

    #[test]
    fn test_cuboid_normalizes_corners() {
        let forward = Node::new("cuboid").attr("min", "0,0,0").attr("max", "5,5,5");
        let reversed = Node::new("cuboid").attr("min", "5,5,5").attr("max", "0,0,0");
        assert_eq!(cuboid(&forward).unwrap(), cuboid(&reversed).unwrap());

        let mixed = Node::new("cuboid").attr("min", "3,-2,8").attr("max", "-1,6,8");
        let Shape::Cuboid(bounds) = cuboid(&mixed).unwrap() else {
            panic!("expected cuboid");
        };
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 8.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 6.0, 8.0));
    }

    #[test]
    fn test_cuboid_missing_min() {
        let node = Node::new("cuboid").attr("max", "5,5,5").at(12, 5);
        let err = cuboid(&node).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::MissingAttribute("min".to_string()));
        assert_eq!(err.location, Some(SourceLocation::new(12, 5)));
    }

    #[test]
    fn test_half_space_stops_at_first_invalid() {
        // y is also malformed, but only x is reported
        let node = Node::new("below")
            .attr("x", "abc")
            .attr("y", "also bad");
        let err = half_space(&node, Direction::Below).unwrap_err();
        assert_eq!(
            err.kind,
            DiagnosticKind::InvalidAttribute {
                name: "x".to_string(),
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_half_space_checks_in_order() {
        let node = Node::new("above").attr("x", "0").attr("z", "0");
        let err = half_space(&node, Direction::Above).unwrap_err();
        assert_eq!(err.kind, DiagnosticKind::MissingAttribute("y".to_string()));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let node = Node::new("sphere").attr("origin", "0,0,0").attr("radius", "-1");
        let err = sphere(&node).unwrap_err();
        assert!(matches!(err.kind, DiagnosticKind::InvalidAttribute { ref name, .. } if name == "radius"));
    }

    #[test]
    fn test_cylinder_negative_height_extends_down() {
        let node = Node::new("cylinder")
            .attr("base", "0,10,0")
            .attr("radius", "1")
            .attr("height", "-4");
        let shape = cylinder(&node).unwrap();
        assert_eq!(
            shape,
            Shape::Cylinder {
                base: Vec3::new(0.0, 6.0, 0.0),
                radius: 1.0,
                height: 4.0,
            }
        );
    }

    #[test]
    fn test_block_is_unit_cube() {
        let node = Node::new("block").attr("location", "1.7,64.2,-3.5");
        let Shape::Cuboid(bounds) = block(&node).unwrap() else {
            panic!("expected cuboid");
        };
        assert_eq!(bounds.min, Vec3::new(1.0, 64.0, -4.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 65.0, -3.0));
    }

    #[test]
    fn test_half_rejects_zero_normal() {
        let node = Node::new("half").attr("origin", "0,0,0").attr("normal", "0,0,0");
        let err = half(&node).unwrap_err();
        assert!(matches!(err.kind, DiagnosticKind::InvalidAttribute { ref name, .. } if name == "normal"));
    }

    #[test]
    fn test_rectangle_normalizes() {
        let node = Node::new("rectangle").attr("min", "4,4").attr("max", "0,-2");
        assert_eq!(
            rectangle(&node).unwrap(),
            Shape::Rectangle {
                min_x: 0.0,
                min_z: -2.0,
                max_x: 4.0,
                max_z: 4.0,
            }
        );
    }
}

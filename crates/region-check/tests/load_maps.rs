//! Integration tests that load example map files end to end.

use std::sync::Arc;

use map_doc::{DocumentError, parse_document};
use rayon::prelude::*;
use region_check::{load_map_source, load_regions};
use rgb_region::{
    Aabb, DiagnosticKind, MAX_REGION_DEPTH, RegionLoader, Shape, SourceLocation, Vec3,
};

const HARBOR: &str = include_str!("maps/harbor.xml");
const BROKEN: &str = include_str!("maps/broken.xml");

#[test]
fn test_harbor_loads_cleanly() {
    let registry = load_map_source(HARBOR).unwrap();
    assert!(
        registry.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        registry.diagnostics()
    );
    assert_eq!(registry.regions().count(), 8);
}

#[test]
fn test_harbor_spawns() {
    let registry = load_map_source(HARBOR).unwrap();

    // Declared with min and max swapped.
    let red = registry.lookup("red-spawn").unwrap();
    assert_eq!(
        red.shape(),
        Some(&Shape::Cuboid(Aabb::from_corners(
            Vec3::ZERO,
            Vec3::new(5.0, 5.0, 5.0)
        )))
    );
    for p in [
        Vec3::ZERO,
        Vec3::new(5.0, 5.0, 5.0),
        Vec3::new(2.0, 2.0, 2.0),
    ] {
        assert!(red.contains(p), "red-spawn should contain {p}");
    }
    assert!(!red.contains(Vec3::new(5.0001, 0.0, 0.0)));
    assert!(!red.contains(Vec3::new(-0.0001, 0.0, 0.0)));

    let spawns = registry.lookup("spawns").unwrap();
    assert!(spawns.contains(Vec3::new(1.0, 1.0, 1.0)));
    assert!(spawns.contains(Vec3::new(101.0, 1.0, 101.0)));
    assert_eq!(
        spawns.bounding_box(),
        Some(Aabb::from_corners(
            Vec3::ZERO,
            Vec3::new(105.0, 5.0, 105.0)
        ))
    );

    let battlefield = registry.lookup("battlefield").unwrap();
    assert!(battlefield.contains(Vec3::new(50.0, 50.0, 50.0)));
    assert!(!battlefield.contains(Vec3::new(2.0, 2.0, 2.0)));
    assert!(battlefield.bounding_box().is_none());
}

#[test]
fn test_harbor_void_and_docks() {
    let registry = load_map_source(HARBOR).unwrap();

    assert!(registry.contains("void", Vec3::new(1.0e6, -0.5, -1.0e6)));
    assert!(!registry.contains("void", Vec3::new(0.0, 0.0, 0.0)));

    // Forward reference: docks is declared after docks-void.
    let docks_void = registry.lookup("docks-void").unwrap();
    assert!(docks_void.is_usable());
    assert!(docks_void.contains(Vec3::new(50.0, -5.0, 50.0)));
    assert!(!docks_void.contains(Vec3::new(0.0, -5.0, 0.0)));
    assert!(!docks_void.contains(Vec3::new(50.0, 5.0, 50.0)));
    assert!(docks_void.bounding_box().is_none());
}

#[test]
fn test_harbor_translated_block() {
    let registry = load_map_source(HARBOR).unwrap();
    let flag = registry.lookup("blue-flag").unwrap();

    assert!(flag.contains(Vec3::new(102.5, 6.5, 102.5)));
    assert!(!flag.contains(Vec3::new(102.5, 5.5, 102.5)));
    assert_eq!(
        flag.bounding_box(),
        Some(Aabb::from_corners(
            Vec3::new(102.0, 6.0, 102.0),
            Vec3::new(103.0, 7.0, 103.0)
        ))
    );
}

#[test]
fn test_broken_map_diagnostics() {
    let registry = load_map_source(BROKEN).unwrap();

    let reported: Vec<_> = registry
        .diagnostics()
        .iter()
        .map(|d| (d.kind.clone(), d.location))
        .collect();
    let at = |line, column| Some(SourceLocation::new(line, column));

    assert_eq!(
        reported,
        [
            (DiagnosticKind::DuplicateRegionId("spawn".to_string()), at(4, 9)),
            (DiagnosticKind::MissingAttribute("min".to_string()), at(5, 9)),
            (
                DiagnosticKind::InvalidAttribute {
                    name: "x".to_string(),
                    value: "abc".to_string()
                },
                at(6, 9)
            ),
            (DiagnosticKind::UnknownRegionKind("pyramid".to_string()), at(7, 9)),
            (
                DiagnosticKind::UnknownRegionReference("missing".to_string()),
                at(10, 13)
            ),
            (
                DiagnosticKind::CyclicRegionReference(vec![
                    "a".to_string(),
                    "b".to_string(),
                    "a".to_string()
                ]),
                at(12, 9)
            ),
        ]
    );
    assert!(registry.has_errors());
}

#[test]
fn test_broken_map_degrades_gracefully() {
    let registry = load_map_source(BROKEN).unwrap();
    let origin = Vec3::new(1.0, 1.0, 1.0);

    // First declaration wins.
    assert!(registry.contains("spawn", origin));
    assert!(!registry.contains("spawn", Vec3::new(12.0, 12.0, 12.0)));

    // Rejected declarations are absent.
    for id in ["lobby", "pit", "tomb"] {
        assert!(registry.lookup(id).is_none(), "{id} should be absent");
    }

    // Unresolved composites and their dependents never contain anything.
    for id in ["zones", "a", "b", "outside-zones"] {
        let region = registry.lookup(id).unwrap();
        assert!(!region.is_usable(), "{id} should be unusable");
        assert!(!region.contains(origin));
        assert!(!region.contains(Vec3::new(1.0e3, 1.0e3, 1.0e3)));
    }
}

#[test]
fn test_module_inline_region() {
    // A gameplay module keeps an anonymous region from its own config.
    let map = parse_document(
        r#"<map>
            <regions><cuboid id="arena" min="0,0,0" max="64,32,64"/></regions>
            <kits><kit-zone><sphere origin="32,16,32" radius="4"/></kit-zone></kits>
        </map>"#,
    )
    .unwrap();
    let regions = map.child("regions").unwrap();
    let kit_zone = &map.child("kits").unwrap().children[0].children[0];

    let mut loader = RegionLoader::new();
    loader.declare_all(&regions.children);
    let kit_index = loader.declare(kit_zone).unwrap();
    let registry = loader.finish();

    let kit = registry.get(kit_index).unwrap();
    assert_eq!(kit.id(), None);
    assert!(kit.contains(Vec3::new(32.0, 19.0, 32.0)));
    assert_eq!(registry.regions().count(), 1);
}

#[test]
fn test_concurrent_queries() {
    let map = parse_document(HARBOR).unwrap();
    let registry = Arc::new(load_regions(&map));

    let points: Vec<Vec3> = (0..10_000)
        .map(|i| {
            let t = f64::from(i);
            Vec3::new(t % 120.0, (t % 20.0) - 10.0, (t * 7.0) % 120.0)
        })
        .collect();

    let sequential: Vec<bool> = points
        .iter()
        .map(|&p| registry.contains("battlefield", p) || registry.contains("docks-void", p))
        .collect();

    let shared = Arc::clone(&registry);
    let parallel: Vec<bool> = points
        .par_iter()
        .map(|&p| shared.contains("battlefield", p) || shared.contains("docks-void", p))
        .collect();

    assert_eq!(sequential, parallel);
}

fn nested_unions(depth: usize) -> String {
    format!(
        "<regions><union id=\"deep\">{}<everywhere/>{}</union></regions>",
        "<union>".repeat(depth),
        "</union>".repeat(depth)
    )
}

#[test]
fn test_deep_nesting_becomes_diagnostic() {
    let registry = load_map_source(&nested_unions(MAX_REGION_DEPTH as usize + 40)).unwrap();

    let too_deep: Vec<_> = registry
        .diagnostics()
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::RegionTooDeep(_)))
        .collect();
    assert_eq!(too_deep.len(), 1);
    assert_eq!(registry.diagnostics().len(), 1);
    assert!(!registry.lookup("deep").unwrap().is_usable());
}

#[test]
fn test_pathological_nesting_is_rejected_by_reader() {
    let err = load_map_source(&nested_unions(200_000)).unwrap_err();
    assert!(matches!(err, DocumentError::TooDeep(_)));
}

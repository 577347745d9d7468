//! Map region checking.
//!
//! Glue between the map document reader and the region engine: finds the
//! `<regions>` blocks of a map, loads them into a [`RegionRegistry`] and
//! evaluates points against the result.

use std::path::PathBuf;

use map_doc::{DocumentError, Element, parse_document};
use rgb_region::{RegionLoader, RegionRegistry, Vec3, parse::parse_vec3};
use thiserror::Error;
use tracing::debug;

/// Tag of the element holding a map's region declarations.
pub const REGIONS_TAG: &str = "regions";

/// Environment variable restricting queries to one region id.
pub const REGION_ENV: &str = "REGION_CHECK_REGION";

/// Malformed command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("usage: region-check <map-file> [x,y,z ...]")]
    MissingMapPath,

    #[error("invalid point '{0}', expected x,y,z")]
    InvalidPoint(String),
}

/// Command-line configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub map_path: PathBuf,
    pub points: Vec<Vec3>,
    /// Only query this region instead of every named one.
    pub region: Option<String>,
}

impl Config {
    /// Build from positional arguments (`<map-file> [x,y,z ...]`, program
    /// name excluded) and the optional region filter.
    ///
    /// # Errors
    ///
    /// Returns `UsageError` if the map path is missing or a point is malformed.
    pub fn from_args(args: &[String], region: Option<String>) -> Result<Self, UsageError> {
        let Some((path, points)) = args.split_first() else {
            return Err(UsageError::MissingMapPath);
        };
        let points = points
            .iter()
            .map(|raw| parse_vec3(raw).ok_or_else(|| UsageError::InvalidPoint(raw.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            map_path: PathBuf::from(path),
            points,
            region: region.filter(|r| !r.is_empty()),
        })
    }
}

/// Load every region declared under the map's `<regions>` elements.
///
/// The root itself may be the `<regions>` element.
#[must_use]
pub fn load_regions(map: &Element) -> RegionRegistry {
    let mut loader = RegionLoader::new();
    if map.tag == REGIONS_TAG {
        loader.declare_all(&map.children);
    } else {
        for block in map.children.iter().filter(|c| c.tag == REGIONS_TAG) {
            debug!("Reading regions block at {}", block.location);
            loader.declare_all(&block.children);
        }
    }
    loader.finish()
}

/// Parse map source and load its regions.
///
/// # Errors
///
/// Returns `DocumentError` if the map itself cannot be parsed. Problems with
/// individual region declarations are reported as diagnostics instead.
pub fn load_map_source(source: &str) -> Result<RegionRegistry, DocumentError> {
    let map = parse_document(source)?;
    Ok(load_regions(&map))
}

/// One containment answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub region: String,
    pub point: Vec3,
    pub inside: bool,
}

/// Evaluate `points` against one region or against every named region.
///
/// Asking for an id that does not exist yields no answers for it.
#[must_use]
pub fn query(registry: &RegionRegistry, only: Option<&str>, points: &[Vec3]) -> Vec<Hit> {
    let regions: Vec<_> = match only {
        Some(id) => registry.lookup(id).into_iter().collect(),
        None => registry.regions().collect(),
    };

    let mut hits = Vec::with_capacity(regions.len() * points.len());
    for region in regions {
        let name = region.id().unwrap_or_default();
        for &point in points {
            hits.push(Hit {
                region: name.to_string(),
                point,
                inside: region.contains(point),
            });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_config_from_args() {
        let config = Config::from_args(&args(&["map.xml", "1,2,3", "(0, 64, 0)"]), None).unwrap();
        assert_eq!(config.map_path, PathBuf::from("map.xml"));
        assert_eq!(
            config.points,
            [Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 64.0, 0.0)]
        );
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_config_rejects_bad_point() {
        let err = Config::from_args(&args(&["map.xml", "1,2"]), None).unwrap_err();
        assert_eq!(err, UsageError::InvalidPoint("1,2".to_string()));
        assert_eq!(err.to_string(), "invalid point '1,2', expected x,y,z");
        assert_eq!(
            Config::from_args(&[], None),
            Err(UsageError::MissingMapPath)
        );
    }

    #[test]
    fn test_empty_region_filter_is_ignored() {
        let config = Config::from_args(&args(&["map.xml"]), Some(String::new())).unwrap();
        assert_eq!(config.region, None);
    }

    #[test]
    fn test_root_regions_element() {
        let registry =
            load_map_source(r#"<regions><cuboid id="a" min="0,0,0" max="1,1,1"/></regions>"#)
                .unwrap();
        assert!(registry.lookup("a").is_some());
    }

    #[test]
    fn test_query_every_region() {
        let registry = load_map_source(
            r#"<map><regions>
                <cuboid id="a" min="0,0,0" max="1,1,1"/>
                <sphere id="b" origin="10,0,0" radius="1"/>
            </regions></map>"#,
        )
        .unwrap();
        let p = Vec3::new(0.5, 0.5, 0.5);

        let hits = query(&registry, None, &[p]);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].inside);
        assert_eq!(hits[1].region, "b");
        assert!(!hits[1].inside);

        assert_eq!(query(&registry, Some("b"), &[p]).len(), 1);
        assert!(query(&registry, Some("zzz"), &[p]).is_empty());
    }
}

//! Map region checker
//!
//! Usage: `region-check <map-file> [x,y,z ...]`
//!
//! Loads the `<regions>` of a map, logs every diagnostic with its source
//! location, then reports which named regions contain each given point.
//! Set `REGION_CHECK_REGION` to query a single region id.
//!
//! Exits with an error if the map cannot be read or any region declaration
//! failed.

use eyre::{WrapErr, bail};
use region_check::{Config, REGION_ENV, load_map_source, query};
use rgb_region::Severity;
use tracing::{error, info, warn};

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("region_check=info".parse()?)
                .add_directive("rgb_region=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_args(&args, std::env::var(REGION_ENV).ok())?;

    info!("Checking regions in {}", config.map_path.display());

    let source = std::fs::read_to_string(&config.map_path)
        .wrap_err_with(|| format!("failed to read {}", config.map_path.display()))?;
    let registry = load_map_source(&source)
        .wrap_err_with(|| format!("failed to parse {}", config.map_path.display()))?;

    for diagnostic in registry.diagnostics() {
        match diagnostic.severity() {
            Severity::Error => error!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
    }

    if let Some(id) = &config.region {
        if registry.lookup(id).is_none() {
            warn!("Region '{}' is not defined in this map", id);
        }
    }

    for hit in query(&registry, config.region.as_deref(), &config.points) {
        let verdict = if hit.inside { "inside" } else { "outside" };
        info!("{} {} '{}'", hit.point, verdict, hit.region);
    }

    if registry.has_errors() {
        let count = registry
            .diagnostics()
            .iter()
            .filter(|d| d.severity() == Severity::Error)
            .count();
        bail!("{} region error(s) in {}", count, config.map_path.display());
    }

    Ok(())
}

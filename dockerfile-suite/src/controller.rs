use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use std::{
    collections::BTreeMap as Map,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    models::{Composition, DistVersion, DistributionMap, RenderContext, SuiteConfig},
    resolver,
};

/// Turns the suites of one image directory into render contexts.
pub struct Controller<'a> {
    image_dir: PathBuf,
    image: String,
    suite_config: SuiteConfig,
    dist_map: &'a DistributionMap,
}

impl<'a> Controller<'a> {
    pub fn init<P>(
        image_dir: P,
        suite_config: SuiteConfig,
        dist_map: &'a DistributionMap,
    ) -> Result<Controller<'a>>
    where
        P: Into<PathBuf>,
    {
        let image_dir = image_dir.into();
        let image = image_name(&image_dir)?;
        info!("image name {:?}", image);

        Ok(Controller {
            image_dir,
            image,
            suite_config,
            dist_map,
        })
    }

    /// Builds one context per suite and applicable variant, suites first,
    /// then variants in configured order. With no suites given, every
    /// subdirectory of the image directory is a suite.
    pub fn composition(&self, suites: &[String]) -> Result<Composition> {
        let suites = if suites.is_empty() {
            let found = discover_suites(&self.image_dir)?;
            info!("discovered suites: {:?}", found);
            found
        } else {
            suites.to_vec()
        };

        let mut composition = Composition::default();
        let mut resolved: Map<String, Option<DistVersion>> = Map::new();

        for suite in suites.iter() {
            for variant in self.suite_config.variants.iter() {
                if !variant.applies_to(suite) {
                    info!("variant {:?} skipped for suite {}", variant.name(), suite);
                    continue;
                }

                let dist_version = match resolved.get(suite) {
                    Some(dist_version) => dist_version.clone(),
                    None => {
                        let dist_version = resolver::resolve(suite, self.dist_map);
                        if dist_version.is_none() {
                            warn!("no distribution mapping for suite {}", suite);
                            composition.unmapped.push(suite.clone());
                        }
                        resolved.insert(suite.clone(), dist_version.clone());
                        dist_version
                    }
                };

                let (dist, version) = match dist_version {
                    Some(DistVersion { dist, version }) => (Some(dist), Some(version)),
                    None => (None, None),
                };

                composition.contexts.push(RenderContext {
                    suite: suite.clone(),
                    variant: variant.name().map(String::from),
                    dist,
                    version,
                    image: self.image.clone(),
                    registry: self.suite_config.registry.clone(),
                });
            }
        }

        Ok(composition)
    }
}

fn image_name(image_dir: &Path) -> Result<String> {
    image_dir
        .file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
        .ok_or_else(|| anyhow!("Couldn't determine the image name from {:?}.", image_dir))
}

fn discover_suites(image_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(image_dir)
        .with_context(|| format!("failed to list suites in {:?}", image_dir))?;

    let mut suites = Vec::new();
    for entry in entries {
        let entry = entry?;
        // Follows symlinks, so linked suite directories count too.
        if !entry.path().is_dir() {
            continue;
        }

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                warn!("skipping non utf-8 directory {:?}", name);
                continue;
            }
        };

        if !name.starts_with('.') {
            suites.push(name);
        }
    }

    suites.sort();
    Ok(suites)
}

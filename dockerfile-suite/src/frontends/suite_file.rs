use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::{collections::BTreeMap as Map, fs, path::Path};

use crate::{
    errors::ConfigError,
    models::{SuiteConfig, Variant},
};

pub const SUITE_FILE: &str = "suite.yml";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    pub registry: Option<String>,

    pub variants: Option<Vec<VariantEntry>>,

    pub latest: Option<Scalar>,
}

/// Suite names like `18.04` or `3.8` are numbers to YAML.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Number(serde_yaml::Number),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::String(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum VariantEntry {
    Plain(Option<Scalar>),
    Restricted(Map<String, Vec<Scalar>>),
}

impl VariantEntry {
    fn into_variant(self) -> std::result::Result<Variant, String> {
        match self {
            VariantEntry::Plain(None) => Ok(Variant::Plain),
            VariantEntry::Plain(Some(name)) => {
                let name = name.into_string();
                if name.is_empty() {
                    Ok(Variant::Plain)
                } else {
                    Ok(Variant::Named(name))
                }
            }
            VariantEntry::Restricted(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "a restricted variant must have exactly one name, found {}",
                        map.len()
                    ));
                }

                let (name, suites) = map.into_iter().next().unwrap_or_default();
                Ok(Variant::Restricted {
                    name,
                    suites: suites.into_iter().map(Scalar::into_string).collect(),
                })
            }
        }
    }
}

/// Reads `suite.yml` from the image directory. A missing or empty file gives
/// the defaults.
pub fn load_suite_config<P: AsRef<Path>>(image_dir: P) -> Result<SuiteConfig> {
    let path = image_dir.as_ref().join(SUITE_FILE);
    if !path.is_file() {
        info!("no {} in {:?}, using defaults", SUITE_FILE, image_dir.as_ref());
        return Ok(SuiteConfig::default());
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("failed to read {:?}", path))?;
    let config = parse_suite_config(&content).map_err(|reason| ConfigError::InvalidSuiteFile {
        path: path.clone(),
        reason,
    })?;
    info!("loaded suite config from {:?}: {:?}", path, config);

    Ok(config)
}

fn parse_suite_config(content: &str) -> std::result::Result<SuiteConfig, String> {
    if content.trim().is_empty() {
        return Ok(SuiteConfig::default());
    }

    let file: Option<SuiteFile> = serde_yaml::from_str(content).map_err(|err| err.to_string())?;
    let file = file.unwrap_or_default();
    let mut config = SuiteConfig::default();

    if let Some(registry) = file.registry.filter(|registry| !registry.is_empty()) {
        config.registry = registry;
    }

    if let Some(entries) = file.variants.filter(|entries| !entries.is_empty()) {
        config.variants = entries
            .into_iter()
            .map(VariantEntry::into_variant)
            .collect::<std::result::Result<_, _>>()?;
    }

    config.latest = file
        .latest
        .map(Scalar::into_string)
        .filter(|latest| !latest.is_empty());

    Ok(config)
}

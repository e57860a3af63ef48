use anyhow::{Context, Result};
use log::{debug, info};
use regex::Regex;
use serde_yaml::Value;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    errors::ConfigError,
    models::{DistributionMap, Matcher},
};

pub const DIST_FILE: &str = "dist.yml";
const REGEXP_TAG: &str = "regexp";

/// Finds and parses `dist.yml` files, remembering every file it has parsed
/// by its absolute path.
#[derive(Debug, Default)]
pub struct DistMapLoader {
    cache: HashMap<PathBuf, Rc<DistributionMap>>,
}

impl DistMapLoader {
    pub fn new() -> DistMapLoader {
        Default::default()
    }

    /// Walks from `start_dir` up to the filesystem root and returns the first
    /// `dist.yml` found.
    pub fn load<P: AsRef<Path>>(&mut self, start_dir: P) -> Result<Rc<DistributionMap>> {
        let start_dir = absolute(start_dir.as_ref())?;

        for dir in start_dir.ancestors() {
            let path = dir.join(DIST_FILE);

            if let Some(map) = self.cache.get(&path) {
                debug!("using cached {:?}", path);
                return Ok(map.clone());
            }

            if path.is_file() {
                let map = Rc::new(read_dist_file(&path)?);
                info!("loaded {:?} with {} distributions", path, map.distributions.len());
                self.cache.insert(path, map.clone());
                return Ok(map);
            }
        }

        Err(ConfigError::DistFileNotFound(start_dir).into())
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir()?;
        Ok(current_dir.join(path))
    }
}

fn read_dist_file(path: &Path) -> Result<DistributionMap> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;

    parse_dist_map(&content).map_err(|reason| {
        ConfigError::InvalidDistFile {
            path: path.to_path_buf(),
            reason,
        }
        .into()
    })
}

fn parse_dist_map(content: &str) -> std::result::Result<DistributionMap, String> {
    let value: Value = serde_yaml::from_str(content).map_err(|err| err.to_string())?;

    let mapping = match value {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(DistributionMap::default()),
        _ => return Err("expected a mapping of distributions".into()),
    };

    let mut distributions = Vec::with_capacity(mapping.len());
    for (dist, matchers) in mapping {
        let dist = scalar_string(&dist).ok_or_else(|| format!("invalid distribution {:?}", dist))?;

        let matchers = match matchers {
            Value::Sequence(matchers) => matchers
                .iter()
                .map(|matcher| parse_matcher(&dist, matcher))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Value::Null => Vec::new(),
            _ => return Err(format!("`{}' must list its suites", dist)),
        };

        distributions.push((dist, matchers));
    }

    Ok(DistributionMap { distributions })
}

fn parse_matcher(dist: &str, value: &Value) -> std::result::Result<Matcher, String> {
    if let Value::Tagged(tagged) = value {
        if tagged.tag != REGEXP_TAG {
            return Err(format!("unknown tag {} in `{}'", tagged.tag, dist));
        }

        let pattern = match &tagged.value {
            Value::String(pattern) => pattern,
            _ => return Err(format!("!{} in `{}' must be a string", REGEXP_TAG, dist)),
        };

        // Patterns match at the start of the suite name only.
        let anchored = format!("^(?:{})", pattern);
        let regex = Regex::new(&anchored)
            .map_err(|err| format!("invalid pattern {:?} in `{}': {}", pattern, dist, err))?;
        return Ok(Matcher::Pattern(regex));
    }

    scalar_string(value)
        .map(Matcher::Exact)
        .ok_or_else(|| format!("invalid suite {:?} in `{}'", value, dist))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

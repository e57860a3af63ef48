use std::{collections::BTreeSet as Set, fmt, path::PathBuf};

use regex::Regex;

pub const TEMPLATE_FILE: &str = "Dockerfile.template";
pub const DOCKERFILE: &str = "Dockerfile";

#[derive(Clone, Debug, Hash, PartialOrd, Ord, PartialEq, Eq)]
pub struct ImageTag(pub String);

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ImageBuildSpec {
    pub tag: ImageTag,
    /// Relative to the image directory, like `context`.
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub no_cache: bool,
    pub remove_intermediate: bool,
}

/// One entry of the `variants` list in suite.yml.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Renders `Dockerfile.template` into `<suite>/Dockerfile`.
    Plain,
    Named(String),
    /// A variant that only applies to the listed suites.
    Restricted { name: String, suites: Set<String> },
}

impl Variant {
    pub fn name(&self) -> Option<&str> {
        match self {
            Variant::Plain => None,
            Variant::Named(name) => Some(name),
            Variant::Restricted { name, .. } => Some(name),
        }
    }

    pub fn applies_to(&self, suite: &str) -> bool {
        match self {
            Variant::Restricted { suites, .. } => suites.contains(suite),
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteConfig {
    pub registry: String,
    pub variants: Vec<Variant>,
    pub latest: Option<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        SuiteConfig {
            registry: String::new(),
            variants: vec![Variant::Plain],
            latest: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Matcher {
    Exact(String),
    Pattern(Regex),
}

#[derive(Clone, Debug, Default)]
pub struct DistributionMap {
    /// Distributions in the order they appear in dist.yml.
    pub distributions: Vec<(String, Vec<Matcher>)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistVersion {
    pub dist: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderContext {
    pub suite: String,
    pub variant: Option<String>,
    pub dist: Option<String>,
    pub version: Option<String>,
    pub image: String,
    pub registry: String,
}

impl RenderContext {
    /// `<suite>` or `<suite>-<variant>`, the part of the tag after the colon.
    pub fn flavor(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}", self.suite, variant),
            None => self.suite.clone(),
        }
    }

    pub fn image_tag(&self) -> ImageTag {
        ImageTag(format!("{}{}:{}", self.registry, self.image, self.flavor()))
    }

    pub fn latest_tag(&self) -> ImageTag {
        ImageTag(format!("{}{}:latest", self.registry, self.image))
    }

    pub fn template_file(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}", TEMPLATE_FILE, variant),
            None => TEMPLATE_FILE.to_string(),
        }
    }

    /// Location of the rendered Dockerfile, relative to the image directory.
    pub fn dockerfile_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in [Some(self.suite.as_str()), self.variant.as_deref()]
            .iter()
            .flatten()
            .filter(|segment| !segment.is_empty())
        {
            path.push(segment);
        }
        path.join(DOCKERFILE)
    }
}

/// Everything derived from an image directory for one run.
#[derive(Clone, Debug, Default)]
pub struct Composition {
    pub contexts: Vec<RenderContext>,
    /// Suites that had no entry in dist.yml, each listed once.
    pub unmapped: Vec<String>,
}

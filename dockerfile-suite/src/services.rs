use anyhow::Result;

use crate::models::{ImageBuildSpec, ImageTag};

/// Executes image operations. Every method reports whether the operation
/// succeeded; an `Err` means it could not be attempted at all.
pub trait ImageBackend {
    fn build_image(&mut self, spec: &ImageBuildSpec) -> Result<bool>;

    fn tag_image(&mut self, source: &ImageTag, target: &ImageTag) -> Result<bool>;

    fn push_image(&mut self, tag: &ImageTag) -> Result<bool>;
}

use anyhow::Result;
use log::info;

use crate::{
    models::{ImageBuildSpec, RenderContext},
    services::ImageBackend,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishOptions {
    pub no_cache: bool,
    pub remove_intermediate: bool,
    pub no_push: bool,
}

/// Builds, tags and pushes the images of rendered Dockerfiles.
pub struct Publisher {
    backend: Box<dyn ImageBackend>,
    options: PublishOptions,
    latest: Option<String>,
    failures: usize,
}

impl Publisher {
    pub fn init<B>(backend: B, options: PublishOptions, latest: Option<String>) -> Publisher
    where
        B: 'static + ImageBackend,
    {
        Publisher {
            backend: Box::new(backend),
            options,
            latest,
            failures: 0,
        }
    }

    /// Number of commands that reported a failure so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn publish_all(&mut self, contexts: &[RenderContext]) -> Result<()> {
        for ctx in contexts.iter() {
            self.publish(ctx)?;
        }

        Ok(())
    }

    /// A failed command is counted and the remaining ones still run.
    pub fn publish(&mut self, ctx: &RenderContext) -> Result<()> {
        let tag = ctx.image_tag();
        let dockerfile = ctx.dockerfile_path();
        let context = dockerfile
            .parent()
            .map(|parent| parent.to_path_buf())
            .unwrap_or_default();

        let spec = ImageBuildSpec {
            tag: tag.clone(),
            dockerfile,
            context,
            no_cache: self.options.no_cache,
            remove_intermediate: self.options.remove_intermediate,
        };

        info!("building {}", tag);
        let built = self.backend.build_image(&spec)?;
        self.record(built);

        if self.is_latest(ctx) {
            let latest = ctx.latest_tag();
            info!("tagging {} as {}", tag, latest);
            let tagged = self.backend.tag_image(&tag, &latest)?;
            self.record(tagged);
        }

        if !self.options.no_push {
            info!("pushing {}", tag);
            let pushed = self.backend.push_image(&tag)?;
            self.record(pushed);
        }

        Ok(())
    }

    fn is_latest(&self, ctx: &RenderContext) -> bool {
        self.latest
            .as_ref()
            .map(|latest| *latest == ctx.flavor())
            .unwrap_or(false)
    }

    fn record(&mut self, success: bool) {
        if !success {
            self.failures += 1;
        }
    }
}

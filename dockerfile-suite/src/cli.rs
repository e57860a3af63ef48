use anyhow::{Context, Result};
use log::info;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use structopt::StructOpt;

use crate::{
    controller::Controller,
    errors::ConfigError,
    frontends::{load_suite_config, DistMapLoader},
    models::{Composition, SuiteConfig, TEMPLATE_FILE},
    output,
    publisher::{PublishOptions, Publisher},
    renderer::Renderer,
    services::ImageBackend,
};

#[derive(Debug, StructOpt)]
pub struct ImageArgs {
    /// Path to an image directory containing Dockerfile.template.
    pub image: Option<String>,

    /// Suites to work on, every suite directory when none are given.
    #[structopt(name = "suite")]
    pub suites: Vec<String>,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "suite-update",
    about = "Generate Dockerfile(s) from suite template files."
)]
pub struct UpdateOpt {
    #[structopt(flatten)]
    pub image: ImageArgs,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "suite-publish",
    about = "Build, tag and push the images of generated Dockerfile(s)."
)]
pub struct PublishOpt {
    #[structopt(flatten)]
    pub image: ImageArgs,

    #[structopt(long)]
    /// Remove intermediate containers after a successful build.
    pub rm: bool,

    #[structopt(long)]
    /// Do not use cache when building the image.
    pub no_cache: bool,

    #[structopt(long)]
    /// Do not push the image after building it.
    pub no_push: bool,

    #[structopt(long)]
    /// Print the docker commands instead of running them.
    pub dry_run: bool,
}

impl PublishOpt {
    pub fn options(&self) -> PublishOptions {
        PublishOptions {
            no_cache: self.no_cache,
            remove_intermediate: self.rm,
            no_push: self.no_push,
        }
    }
}

fn has_template(dir: &Path) -> bool {
    dir.join(TEMPLATE_FILE).is_file()
}

/// Picks the image directory and the suites to process.
///
/// An `image` argument without a template is taken as the first suite when
/// the current directory has one.
pub fn select_image_dir(args: &ImageArgs, current_dir: &Path) -> Result<(PathBuf, Vec<String>)> {
    let mut suites = args.suites.clone();

    let image_dir = match &args.image {
        Some(image) => {
            let image_path = current_dir.join(image);
            if has_template(&image_path) {
                // Resolves `.` and `..`, the image name is the last component.
                fs::canonicalize(&image_path)
                    .with_context(|| format!("failed to resolve {:?}", image_path))?
            } else if has_template(current_dir) {
                suites.insert(0, image.clone());
                current_dir.to_path_buf()
            } else {
                return Err(ConfigError::TemplateNotFound(image_path.join(TEMPLATE_FILE)).into());
            }
        }
        None => {
            if !has_template(current_dir) {
                return Err(ConfigError::TemplateNotFound(current_dir.join(TEMPLATE_FILE)).into());
            }
            current_dir.to_path_buf()
        }
    };

    info!("image directory {:?}, suites {:?}", image_dir, suites);
    Ok((image_dir, suites))
}

/// Loads the configuration of an image directory and builds its contexts.
pub fn compose(
    loader: &mut DistMapLoader,
    image_dir: &Path,
    suites: &[String],
) -> Result<(SuiteConfig, Composition)> {
    let suite_config = load_suite_config(image_dir)?;
    let dist_map = loader.load(image_dir)?;

    let controller = Controller::init(image_dir, suite_config.clone(), &dist_map)?;
    let composition = controller.composition(suites)?;

    Ok((suite_config, composition))
}

fn report_unmapped(out: &mut impl Write, composition: &Composition) -> Result<()> {
    for suite in composition.unmapped.iter() {
        output::print_unmapped(out, suite)?;
    }

    Ok(())
}

/// Renders every context, printing each diff before the file is rewritten.
/// Suites without a distribution mapping are reported and left untouched.
pub fn update(image_dir: &Path, suites: &[String], out: &mut impl Write) -> Result<Composition> {
    let mut loader = DistMapLoader::new();
    let (_, composition) = compose(&mut loader, image_dir, suites)?;
    report_unmapped(out, &composition)?;

    let renderer = Renderer::new(image_dir);
    for ctx in composition.contexts.iter() {
        if ctx.dist.is_none() {
            info!("skipping unmapped suite {} ({:?})", ctx.suite, ctx.variant);
            continue;
        }

        let rendered = renderer.render(ctx)?;
        output::print_diff(out, &rendered.diff)?;
        rendered.write()?;
    }

    Ok(composition)
}

/// Publishes every context and returns the number of failed commands.
pub fn publish<B>(
    image_dir: &Path,
    suites: &[String],
    options: PublishOptions,
    backend: B,
    out: &mut impl Write,
) -> Result<usize>
where
    B: 'static + ImageBackend,
{
    let mut loader = DistMapLoader::new();
    let (suite_config, composition) = compose(&mut loader, image_dir, suites)?;
    report_unmapped(out, &composition)?;

    let mut publisher = Publisher::init(backend, options, suite_config.latest);
    publisher.publish_all(&composition.contexts)?;

    Ok(publisher.failures())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(image: Option<&str>, suites: &[&str]) -> ImageArgs {
        ImageArgs {
            image: image.map(Into::into),
            suites: suites.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn image_argument_with_template() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("base")).unwrap();
        fs::write(dir.path().join("base").join(TEMPLATE_FILE), "FROM x").unwrap();

        let (image_dir, suites) =
            select_image_dir(&args(Some("base"), &["bionic"]), dir.path()).unwrap();
        assert_eq!(image_dir, fs::canonicalize(dir.path().join("base")).unwrap());
        assert_eq!(suites, vec!["bionic".to_string()]);
    }

    #[test]
    fn parent_image_argument_is_normalized() {
        let dir = TempDir::new().unwrap();
        let image_dir = dir.path().join("base");
        fs::create_dir_all(image_dir.join("bionic")).unwrap();
        fs::write(image_dir.join(TEMPLATE_FILE), "FROM x").unwrap();

        let (selected, suites) =
            select_image_dir(&args(Some(".."), &["bionic"]), &image_dir.join("bionic")).unwrap();
        assert_eq!(selected, fs::canonicalize(&image_dir).unwrap());
        assert_eq!(selected.file_name().unwrap(), "base");
        assert_eq!(suites, vec!["bionic".to_string()]);
    }

    #[test]
    fn image_argument_is_a_suite_inside_an_image() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TEMPLATE_FILE), "FROM x").unwrap();
        fs::create_dir(dir.path().join("bionic")).unwrap();

        let (image_dir, suites) =
            select_image_dir(&args(Some("bionic"), &["xenial"]), dir.path()).unwrap();
        assert_eq!(image_dir, dir.path());
        assert_eq!(suites, vec!["bionic".to_string(), "xenial".to_string()]);
    }

    #[test]
    fn no_arguments_use_current_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TEMPLATE_FILE), "FROM x").unwrap();

        let (image_dir, suites) = select_image_dir(&args(None, &[]), dir.path()).unwrap();
        assert_eq!(image_dir, dir.path());
        assert!(suites.is_empty());
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = TempDir::new().unwrap();

        let err = select_image_dir(&args(None, &[]), dir.path()).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::TemplateNotFound(path)) => {
                assert_eq!(path, &dir.path().join(TEMPLATE_FILE))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = select_image_dir(&args(Some("base"), &[]), dir.path()).unwrap_err();
        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::TemplateNotFound(path)) => {
                assert_eq!(path, &dir.path().join("base").join(TEMPLATE_FILE))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn parses_publish_flags() {
        let opt = PublishOpt::from_iter(&[
            "suite-publish",
            "--rm",
            "--no-push",
            "base",
            "bionic",
            "xenial",
        ]);

        assert_eq!(opt.image.image.as_deref(), Some("base"));
        assert_eq!(opt.image.suites, vec!["bionic".to_string(), "xenial".to_string()]);
        assert_eq!(
            opt.options(),
            PublishOptions {
                no_cache: false,
                remove_intermediate: true,
                no_push: true,
            }
        );
        assert!(!opt.dry_run);
    }
}

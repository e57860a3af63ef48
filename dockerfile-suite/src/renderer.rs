use anyhow::{Context as _, Result};
use log::{debug, info};
use similar::TextDiff;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};

use crate::{errors::ConfigError, models::RenderContext};

/// Result of rendering one context, not yet written.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub path: PathBuf,
    /// New file content, including the trailing newline.
    pub content: String,
    /// Unified diff against the current file, empty when nothing changed.
    pub diff: String,
}

impl Rendered {
    /// Overwrites the Dockerfile, even when the diff is empty.
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {:?}", parent))?;
        }
        fs::write(&self.path, &self.content)
            .with_context(|| format!("failed to write {:?}", self.path))?;
        info!("wrote {:?}", self.path);

        Ok(())
    }
}

pub struct Renderer {
    image_dir: PathBuf,
}

impl Renderer {
    pub fn new<P: Into<PathBuf>>(image_dir: P) -> Renderer {
        Renderer {
            image_dir: image_dir.into(),
        }
    }

    pub fn template_path(&self, ctx: &RenderContext) -> Result<PathBuf> {
        let path = self.image_dir.join(ctx.template_file());
        if !path.is_file() {
            return Err(ConfigError::TemplateNotFound(path).into());
        }

        Ok(path)
    }

    /// Renders the template of `ctx` and diffs it against the current
    /// Dockerfile. Nothing is written until [`Rendered::write`].
    pub fn render(&self, ctx: &RenderContext) -> Result<Rendered> {
        let template_path = self.template_path(ctx)?;
        let template = fs::read_to_string(&template_path)
            .with_context(|| format!("failed to read {:?}", template_path))?;

        let content = render_template(&template, ctx).with_context(|| {
            format!("failed to render {:?} for suite {}", template_path, ctx.suite)
        })?;
        let content = format!("{}\n", content);

        let path = self.image_dir.join(ctx.dockerfile_path());
        let diff = diff_with_current(&path, &content)?;

        Ok(Rendered {
            path,
            content,
            diff,
        })
    }
}

/// Renders Jinja style templates. Absent `dist` and `version` stay
/// undefined so templates using them fail loudly.
pub fn render_template(template: &str, ctx: &RenderContext) -> Result<String> {
    let mut context = Context::new();
    context.insert("suite", &ctx.suite);
    context.insert("variant", ctx.variant.as_deref().unwrap_or(""));
    context.insert("image", &ctx.image);
    context.insert("registry", &ctx.registry);
    if let Some(dist) = &ctx.dist {
        context.insert("dist", dist);
    }
    if let Some(version) = &ctx.version {
        context.insert("version", version);
    }

    let mut rendered = Tera::one_off(template, &context, false)?;

    // Jinja drops a single trailing newline.
    if rendered.ends_with('\n') {
        rendered.pop();
        if rendered.ends_with('\r') {
            rendered.pop();
        }
    }

    Ok(rendered)
}

/// Diffs the current content of `path`, empty when missing, against
/// `content`. The diff has no context lines and labels the old side
/// `<path>~`.
pub fn diff_with_current(path: &Path, content: &str) -> Result<String> {
    let current = match fs::read_to_string(path) {
        Ok(current) => current,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err).with_context(|| format!("failed to read {:?}", path)),
    };

    let label = absolute_label(path)?;
    let diff = TextDiff::from_lines(current.as_str(), content)
        .unified_diff()
        .context_radius(0)
        .header(&format!("{}~", label), &label)
        .to_string();
    debug!("diff for {:?}: {} bytes", path, diff.len());

    Ok(diff)
}

fn absolute_label(path: &Path) -> Result<String> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    Ok(path.display().to_string())
}

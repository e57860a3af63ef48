use anyhow::{Context, Result};
use log::{info, warn};
use std::{
    fmt,
    io::{stdout, Write},
    path::PathBuf,
    process::Command,
};

use crate::{
    models::{ImageBuildSpec, ImageTag},
    services::ImageBackend,
};

/// A docker invocation, kept as separate arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DockerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for DockerCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in self.args.iter() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs the docker CLI from the image directory. In dry-run mode the
/// commands are only echoed.
pub struct DockerBackend {
    program: String,
    work_dir: PathBuf,
    dry_run: bool,
}

impl DockerBackend {
    pub fn new<P: Into<PathBuf>>(work_dir: P, dry_run: bool) -> DockerBackend {
        DockerBackend {
            program: "docker".into(),
            work_dir: work_dir.into(),
            dry_run,
        }
    }

    pub fn with_program<S: Into<String>>(mut self, program: S) -> DockerBackend {
        self.program = program.into();
        self
    }

    pub fn build_command(&self, spec: &ImageBuildSpec) -> DockerCommand {
        let mut args = vec!["build".to_string()];
        if spec.no_cache {
            args.push("--no-cache".into());
        }
        if spec.remove_intermediate {
            args.push("--rm".into());
        }
        args.push("-f".into());
        args.push(spec.dockerfile.display().to_string());
        args.push("-t".into());
        args.push(spec.tag.0.clone());
        args.push(spec.context.display().to_string());

        self.command(args)
    }

    pub fn tag_command(&self, source: &ImageTag, target: &ImageTag) -> DockerCommand {
        self.command(vec!["tag".into(), source.0.clone(), target.0.clone()])
    }

    pub fn push_command(&self, tag: &ImageTag) -> DockerCommand {
        self.command(vec!["push".into(), tag.0.clone()])
    }

    fn command(&self, args: Vec<String>) -> DockerCommand {
        DockerCommand {
            program: self.program.clone(),
            args,
        }
    }

    fn run(&mut self, command: DockerCommand) -> Result<bool> {
        if self.dry_run {
            let mut stdout = stdout();
            writeln!(stdout, "{}", command)?;
            stdout.flush()?;
            return Ok(true);
        }

        info!("running {} in {:?}", command, self.work_dir);
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&self.work_dir)
            .status()
            .with_context(|| format!("failed to run `{}'", command))?;

        if !status.success() {
            warn!("`{}' exited with {}", command, status);
        }

        Ok(status.success())
    }
}

impl ImageBackend for DockerBackend {
    fn build_image(&mut self, spec: &ImageBuildSpec) -> Result<bool> {
        let command = self.build_command(spec);
        self.run(command)
    }

    fn tag_image(&mut self, source: &ImageTag, target: &ImageTag) -> Result<bool> {
        let command = self.tag_command(source, target);
        self.run(command)
    }

    fn push_image(&mut self, tag: &ImageTag) -> Result<bool> {
        let command = self.push_command(tag);
        self.run(command)
    }
}

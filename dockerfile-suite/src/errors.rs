use std::path::PathBuf;
use thiserror::Error;

/// Misconfiguration of an image directory. Fatal for both tools.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("template file `{}' not found!", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("file `dist.yml' not found in `{}' or any of its parent directories!", .0.display())]
    DistFileNotFound(PathBuf),

    #[error("invalid suite file `{}': {}", .path.display(), .reason)]
    InvalidSuiteFile { path: PathBuf, reason: String },

    #[error("invalid dist file `{}': {}", .path.display(), .reason)]
    InvalidDistFile { path: PathBuf, reason: String },
}

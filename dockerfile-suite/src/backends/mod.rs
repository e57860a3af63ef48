pub mod docker;

pub use docker::{DockerBackend, DockerCommand};

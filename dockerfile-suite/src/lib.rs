//! Renders `Dockerfile.template` files into one Dockerfile per suite and
//! variant, and publishes the resulting images with docker.
//!
//! An image directory holds the templates, an optional `suite.yml` and one
//! subdirectory per suite. Suites are mapped to distributions by the nearest
//! `dist.yml` in the image directory or any of its parents.

pub mod backends;
pub mod cli;
pub mod controller;
pub mod errors;
pub mod frontends;
pub mod models;
pub mod output;
pub mod publisher;
pub mod renderer;
pub mod resolver;
pub mod services;

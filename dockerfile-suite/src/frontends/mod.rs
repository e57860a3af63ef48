pub mod dist_file;
pub mod suite_file;

pub use dist_file::DistMapLoader;
pub use suite_file::load_suite_config;

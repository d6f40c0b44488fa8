mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_geometry_config, build_msd_config, build_run_config};
pub use models::GeometryConfig;

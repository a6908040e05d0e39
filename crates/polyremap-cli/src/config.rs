mod builder;
mod defaults;
mod file;

pub use builder::{OutputOverrides, build_config, build_request, chemistry};

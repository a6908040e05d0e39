use polyremap::engine::config::CleanupPolicy;

/// Values the CLI falls back to when neither a flag nor the config file sets them.
///
/// Force-field, tool and output defaults live in the core builder; only what the
/// command line owns is kept here.
pub struct DefaultsConfig {
    pub density: f64,
    pub solvate: bool,
    pub cleanup: CleanupPolicy,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            solvate: true,
            cleanup: CleanupPolicy::Never,
        }
    }
}

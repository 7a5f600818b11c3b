/// Limits applied when loading a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Maximum bytes read from a configuration file.
    pub max_config_file_size: usize,
    /// Maximum number of descriptor entries.
    pub max_descriptors: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_config_file_size: 256 * 1024,
            // One per possible identifier byte.
            max_descriptors: 256,
        }
    }
}

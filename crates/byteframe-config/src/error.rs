use byteframe_parser::DescriptorError;

/// Errors that can occur while loading a parser configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be loaded.
    #[error("failed to load config: {0}")]
    LoadFailed(String),

    /// The document is not valid JSON or does not match the expected shape.
    #[error("config is not valid: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A descriptor entry was rejected by the descriptor table.
    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    /// The document declares more descriptors than the loader allows.
    #[error("too many descriptors ({count}, max {max})")]
    TooManyDescriptors { count: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

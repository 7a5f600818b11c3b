/// Default maximum payload size: 64 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024;

/// Configuration shared by [`MessageReader`](crate::MessageReader) and the async codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest payload accepted for a single message. Default: 64 KiB.
    pub max_payload_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

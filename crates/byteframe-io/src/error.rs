use byteframe_parser::Status;

/// Errors that can occur while reading messages from a byte source.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The message in progress grew past the configured limit. The parser was reset.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading from the source.
    #[error("read I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source reached end of stream between messages.
    #[error("end of stream")]
    EndOfStream,

    /// The source ended inside a message. `pending` counts its payload bytes, which may be zero
    /// when the stream stopped after the start marker or identifier.
    #[error("end of stream inside a message ({status}, {pending} pending payload bytes)")]
    Truncated { status: Status, pending: usize },
}

pub type Result<T> = std::result::Result<T, ReadError>;

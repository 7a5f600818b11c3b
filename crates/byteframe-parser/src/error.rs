/// Errors raised while building a descriptor table.
///
/// These are configuration-time failures: a table that produced one of them must not be used to
/// construct a parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// A sized descriptor was registered without a positive length.
    #[error("descriptor 0x{id:02X}: sized framing requires a length greater than zero")]
    SizeNotSet { id: u8 },

    /// A descriptor with the same identifier is already registered.
    #[error("descriptor 0x{id:02X} is already registered")]
    IdAliasing { id: u8 },
}

/// Errors raised by [`encode_message`](crate::encode::encode_message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Sized descriptors accept exactly `expected` data bytes.
    #[error("descriptor 0x{id:02X} expects {expected} data bytes, got {actual}")]
    LengthMismatch {
        id: u8,
        expected: usize,
        actual: usize,
    },

    /// Bounded data would be cut short by an embedded end marker.
    #[error("data for descriptor 0x{id:02X} contains the end marker at offset {offset}")]
    EmbeddedEndMarker { id: u8, offset: usize },
}

pub type Result<T> = std::result::Result<T, DescriptorError>;

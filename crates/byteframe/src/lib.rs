//! Byte-stream message framing.
//!
//! byteframe recognizes messages on an arbitrary byte stream. Each message starts with a start
//! marker and a one-byte identifier; the identifier selects how the payload ends (an end marker
//! or a declared length) and whether an 8-bit additive checksum follows it.
//!
//! # Crate Structure
//!
//! - [`parser`] — Descriptor table, byte-at-a-time state machine, observers, encoder
//! - [`config`] — JSON descriptor-table configuration (behind `config` feature)
//! - [`io`] — Blocking reader and async codec drivers (behind `io` feature)

/// Re-export parser types.
pub mod parser {
    pub use byteframe_parser::*;
}

/// Re-export configuration types (requires `config` feature).
#[cfg(feature = "config")]
pub mod config {
    pub use byteframe_config::*;
}

/// Re-export reader types (requires `io` feature).
#[cfg(feature = "io")]
pub mod io {
    pub use byteframe_io::*;
}

pub use byteframe_parser::{
    Descriptor, DescriptorTable, Framing, Markers, Message, ParseError, ParseErrorKind,
    ParseEvent, ParseResult, Parser,
};

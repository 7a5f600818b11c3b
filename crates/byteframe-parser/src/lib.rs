//! Byte-at-a-time message framing with per-identifier policies.
//!
//! A stream carries messages of several kinds, each introduced by a start marker and a one-byte
//! identifier:
//! - a [`DescriptorTable`] maps each identifier to its framing (terminator-delimited or fixed
//!   length) and whether an 8-bit additive checksum trails the payload
//! - the [`Parser`] consumes bytes one at a time and reports completed messages and errors,
//!   resynchronizing on the next start marker after any error
//! - observers subscribed to the parser see every terminal event before `feed` returns
//!
//! The parser never blocks and never spawns; it is driven by whatever owns the byte source.

pub mod checksum;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod event;
pub mod parser;

pub use checksum::{additive, Checksum};
pub use descriptor::{Descriptor, DescriptorTable, Framing};
pub use encode::encode_message;
pub use error::{DescriptorError, EncodeError, Result};
pub use event::{Message, ParseError, ParseErrorKind, ParseEvent, ParseObserver, ParseResult};
pub use parser::{Markers, Parser, Status, DEFAULT_END_MARKER};

//! Drive byteframe parsers from byte sources.
//!
//! The parser itself only consumes single bytes. This crate connects it to real transports:
//! - [`MessageReader`] pulls from any blocking `Read` (files, serial ports, sockets)
//! - `MessageCodec` (feature `async`) plugs into `tokio_util::codec::FramedRead`
//!
//! Both apply a payload limit so an unterminated message cannot grow without bound.

pub mod config;
pub mod error;
mod pump;
pub mod reader;

#[cfg(feature = "async")]
pub mod codec;

pub use config::{ReaderConfig, DEFAULT_MAX_PAYLOAD};
pub use error::{ReadError, Result};
pub use reader::{Events, MessageReader};

#[cfg(feature = "async")]
pub use codec::MessageCodec;

//! JSON configuration for byteframe parsers.
//!
//! Builds a validated [`DescriptorTable`](byteframe_parser::DescriptorTable) and
//! [`Parser`](byteframe_parser::Parser) from a small JSON document. Invalid descriptors abort
//! loading, so a parser built here never starts from a bad table.

pub mod config;
pub mod document;
pub mod error;

pub use config::LoaderConfig;
pub use document::{parse_byte, ByteValue, DescriptorConfig, FramingKind, ParserConfig};
pub use error::{ConfigError, Result};

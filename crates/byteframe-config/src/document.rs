use std::fmt;
use std::io::Read;
use std::path::Path;

use byteframe_parser::{
    DescriptorError, DescriptorTable, Framing, Markers, Parser, DEFAULT_END_MARKER,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LoaderConfig;
use crate::error::{ConfigError, Result};

/// A byte value written either as an integer (`126`) or a string (`"0x7E"`, `"126"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawByte")]
pub struct ByteValue(pub u8);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawByte {
    Int(i64),
    Text(String),
}

impl TryFrom<RawByte> for ByteValue {
    type Error = String;

    fn try_from(raw: RawByte) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawByte::Int(value) => u8::try_from(value)
                .map(ByteValue)
                .map_err(|_| format!("byte value out of range: {value}")),
            RawByte::Text(text) => parse_byte(&text)
                .map(ByteValue)
                .ok_or_else(|| format!("invalid byte value: {text:?}")),
        }
    }
}

/// Parse `0x`-prefixed hex or decimal text into a byte.
pub fn parse_byte(text: &str) -> Option<u8> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => text.parse::<u8>().ok(),
    }
}

impl fmt::Display for ByteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

fn default_end_marker() -> ByteValue {
    ByteValue(DEFAULT_END_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FramingKind {
    Bounded,
    Sized,
}

/// One descriptor entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorConfig {
    pub id: ByteValue,
    pub framing: FramingKind,
    /// Required for sized framing, ignored for bounded framing.
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default)]
    pub checksum: bool,
    /// Display name used by tooling.
    #[serde(default)]
    pub name: Option<String>,
}

impl DescriptorConfig {
    /// Resolve the framing policy, rejecting sized entries without a positive length.
    pub fn framing(&self) -> std::result::Result<Framing, DescriptorError> {
        match (self.framing, self.length) {
            (FramingKind::Sized, None | Some(0)) => {
                Err(DescriptorError::SizeNotSet { id: self.id.0 })
            }
            (FramingKind::Sized, Some(len)) => Ok(Framing::Sized(len)),
            (FramingKind::Bounded, Some(len)) => {
                warn!(id = self.id.0, len, "length ignored for bounded descriptor");
                Ok(Framing::Bounded)
            }
            (FramingKind::Bounded, None) => Ok(Framing::Bounded),
        }
    }
}

/// Parser configuration document.
///
/// ```json
/// {
///   "start_marker": "0x7E",
///   "end_marker": 127,
///   "descriptors": [
///     { "id": 1, "framing": "sized", "length": 2, "checksum": true },
///     { "id": "0x02", "framing": "bounded", "name": "text" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParserConfig {
    pub start_marker: ByteValue,
    #[serde(default = "default_end_marker")]
    pub end_marker: ByteValue,
    #[serde(default)]
    pub descriptors: Vec<DescriptorConfig>,
}

impl ParserConfig {
    /// Parse a configuration from JSON text with default limits.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_config(json, LoaderConfig::default())
    }

    /// Parse a configuration from JSON text with explicit limits.
    pub fn from_json_str_with_config(json: &str, loader: LoaderConfig) -> Result<Self> {
        let config: ParserConfig = serde_json::from_str(json)?;
        if config.descriptors.len() > loader.max_descriptors {
            return Err(ConfigError::TooManyDescriptors {
                count: config.descriptors.len(),
                max: loader.max_descriptors,
            });
        }
        if config.start_marker == config.end_marker {
            warn!(
                marker = config.start_marker.0,
                "start and end markers are the same byte"
            );
        }
        Ok(config)
    }

    /// Load a configuration file with default limits.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_config(path, LoaderConfig::default())
    }

    /// Load a configuration file with explicit limits. Symlinks are refused.
    pub fn from_path_with_config(path: &Path, loader: LoaderConfig) -> Result<Self> {
        let metadata = std::fs::symlink_metadata(path)
            .map_err(|err| ConfigError::LoadFailed(format!("{}: {err}", path.display())))?;
        if metadata.file_type().is_symlink() {
            return Err(ConfigError::LoadFailed(format!(
                "refusing to load config symlink: {}",
                path.display()
            )));
        }
        if !metadata.is_file() {
            return Err(ConfigError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > loader.max_config_file_size as u64 {
            return Err(ConfigError::LoadFailed(format!(
                "config file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let file = std::fs::File::open(path).map_err(|err| {
            ConfigError::LoadFailed(format!("failed opening {}: {err}", path.display()))
        })?;
        let read_limit =
            u64::try_from(loader.max_config_file_size.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                ConfigError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > loader.max_config_file_size {
            return Err(ConfigError::LoadFailed(format!(
                "config file too large while reading: {}",
                path.display()
            )));
        }

        debug!(path = %path.display(), "loaded parser config");
        Self::from_json_str_with_config(&content, loader)
    }

    pub fn markers(&self) -> Markers {
        Markers::new(self.start_marker.0).with_end(self.end_marker.0)
    }

    /// Build the descriptor table. The first invalid entry aborts construction.
    pub fn build_table(&self) -> Result<DescriptorTable> {
        let mut table = DescriptorTable::new();
        for entry in &self.descriptors {
            table.register(entry.id.0, entry.framing()?, entry.checksum)?;
        }
        Ok(table)
    }

    /// Build a ready-to-feed parser.
    pub fn build_parser(&self) -> Result<Parser> {
        Ok(Parser::new(self.markers(), self.build_table()?))
    }

    /// Display name of a descriptor, if the document gives one.
    pub fn name_of(&self, id: u8) -> Option<&str> {
        self.descriptors
            .iter()
            .find(|d| d.id.0 == id)
            .and_then(|d| d.name.as_deref())
    }
}

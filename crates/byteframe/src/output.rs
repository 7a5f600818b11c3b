use std::io::{IsTerminal, Write};

use byteframe_parser::{Descriptor, Framing, Markers, ParseEvent};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventRow {
    pub index: usize,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<String>,
    #[serde(skip)]
    raw: Option<Vec<u8>>,
}

impl EventRow {
    pub fn from_event(index: usize, event: &ParseEvent, name: Option<&str>) -> Self {
        match event {
            ParseEvent::Completed(message) => Self {
                index,
                event: "completed",
                id: Some(byte_label(message.id)),
                name: name.map(str::to_string),
                payload_size: Some(message.payload.len()),
                payload_hex: Some(hex(&message.payload)),
                kind: None,
                observed: None,
                raw: Some(message.payload.to_vec()),
            },
            ParseEvent::Error(err) => Self {
                index,
                event: "error",
                id: None,
                name: None,
                payload_size: None,
                payload_hex: None,
                kind: Some(err.kind.to_string()),
                observed: err.observed.map(byte_label),
                raw: None,
            },
        }
    }

    /// A limit breach reported by the reader rather than the parser.
    pub fn overflow(index: usize, size: usize) -> Self {
        Self {
            index,
            event: "error",
            id: None,
            name: None,
            payload_size: Some(size),
            payload_hex: None,
            kind: Some("payload_too_large".to_string()),
            observed: None,
            raw: None,
        }
    }

    fn summary(&self) -> String {
        match (&self.payload_hex, &self.kind) {
            (Some(hex), _) => hex.clone(),
            (None, Some(kind)) => match &self.observed {
                Some(observed) => format!("{kind} (observed {observed})"),
                None => kind.clone(),
            },
            (None, None) => String::new(),
        }
    }
}

/// Prints events as they arrive; tables are buffered until `finish`.
pub struct EventPrinter {
    format: OutputFormat,
    rows: Vec<EventRow>,
}

impl EventPrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: EventRow) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string(&row).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Pretty => {
                let id = row.id.as_deref().unwrap_or("-");
                println!(
                    "#{} {} id={} {}",
                    row.index,
                    row.event,
                    id,
                    row.summary()
                );
            }
            OutputFormat::Raw => {
                if let Some(raw) = &row.raw {
                    print_raw(raw);
                }
            }
            OutputFormat::Table => self.rows.push(row),
        }
    }

    pub fn finish(self) {
        if !matches!(self.format, OutputFormat::Table) || self.rows.is_empty() {
            return;
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "EVENT", "ID", "NAME", "SIZE", "DETAIL"]);
        for row in &self.rows {
            table.add_row(vec![
                row.index.to_string(),
                row.event.to_string(),
                row.id.clone().unwrap_or_default(),
                row.name.clone().unwrap_or_default(),
                row.payload_size.map(|s| s.to_string()).unwrap_or_default(),
                row.summary(),
            ]);
        }
        println!("{table}");
    }
}

#[derive(Debug, Serialize)]
pub struct DescriptorRow {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub framing: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    pub checksum: bool,
}

impl DescriptorRow {
    pub fn new(descriptor: &Descriptor, name: Option<&str>) -> Self {
        let (framing, length) = match descriptor.framing() {
            Framing::Bounded => ("bounded", None),
            Framing::Sized(len) => ("sized", Some(len)),
        };
        Self {
            id: byte_label(descriptor.id()),
            name: name.map(str::to_string),
            framing,
            length,
            checksum: descriptor.checksum(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TableOutput<'a> {
    start_marker: String,
    end_marker: String,
    descriptors: &'a [DescriptorRow],
}

pub fn print_descriptors(markers: Markers, rows: &[DescriptorRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = TableOutput {
                start_marker: byte_label(markers.start),
                end_marker: byte_label(markers.end),
                descriptors: rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!(
                "start={} end={}",
                byte_label(markers.start),
                byte_label(markers.end)
            );
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "FRAMING", "LENGTH", "CHECKSUM"]);
            for row in rows {
                table.add_row(vec![
                    row.id.clone(),
                    row.name.clone().unwrap_or_default(),
                    row.framing.to_string(),
                    row.length.map(|l| l.to_string()).unwrap_or_default(),
                    row.checksum.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "start={} end={}",
                byte_label(markers.start),
                byte_label(markers.end)
            );
            for row in rows {
                println!(
                    "id={} framing={} length={} checksum={}{}",
                    row.id,
                    row.framing,
                    row.length.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
                    row.checksum,
                    row.name
                        .as_deref()
                        .map(|n| format!(" name={n}"))
                        .unwrap_or_default()
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn byte_label(byte: u8) -> String {
    format!("0x{byte:02X}")
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

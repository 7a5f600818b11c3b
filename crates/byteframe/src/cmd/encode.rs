use bytes::BytesMut;
use serde::Serialize;

use byteframe_parser::encode_message;

use crate::cmd::{decode_hex, load_config, parse_id, EncodeArgs};
use crate::exit::{config_error, encode_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{byte_label, hex, print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    id: String,
    size: usize,
    wire_hex: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(&args.config)?;
    let table = config
        .build_table()
        .map_err(|err| config_error("config", err))?;

    let id = parse_id(&args.id)?;
    let descriptor = table
        .lookup(id)
        .ok_or_else(|| CliError::new(USAGE, format!("no descriptor for id {}", byte_label(id))))?;

    let data = match (&args.data, &args.hex) {
        (Some(text), None) => text.as_bytes().to_vec(),
        (None, Some(hex_text)) => decode_hex(hex_text)
            .map_err(|err| CliError::new(USAGE, format!("--hex: {err}")))?,
        (None, None) => Vec::new(),
        (Some(_), Some(_)) => {
            return Err(CliError::new(USAGE, "--data and --hex are exclusive"));
        }
    };

    let mut wire = BytesMut::new();
    encode_message(config.markers(), descriptor, &data, &mut wire)
        .map_err(|err| encode_error("encode failed", err))?;

    match format {
        OutputFormat::Raw => print_raw(&wire),
        OutputFormat::Json => {
            let out = EncodeOutput {
                id: byte_label(id),
                size: wire.len(),
                wire_hex: hex(&wire),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex(&wire)),
    }

    Ok(SUCCESS)
}

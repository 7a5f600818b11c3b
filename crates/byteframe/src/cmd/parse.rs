use std::fs::File;
use std::io::{Cursor, Read};

use byteframe_io::{MessageReader, ReadError, ReaderConfig, DEFAULT_MAX_PAYLOAD};
use byteframe_parser::ParseEvent;

use crate::cmd::{decode_hex, load_config, ParseArgs};
use crate::exit::{
    config_error, io_error, read_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{EventPrinter, EventRow, OutputFormat};

pub fn run(args: ParseArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(&args.config)?;
    let parser = config
        .build_parser()
        .map_err(|err| config_error("config", err))?;

    let source = open_input(&args)?;
    let reader_config = ReaderConfig {
        max_payload_size: args.max_payload.unwrap_or(DEFAULT_MAX_PAYLOAD),
    };
    let mut reader = MessageReader::with_config(source, parser, reader_config);
    let mut printer = EventPrinter::new(format);

    let mut index = 0usize;
    let mut completed = 0usize;
    let mut errors = 0usize;

    for item in reader.events() {
        match item {
            Ok(event) => {
                let name = match &event {
                    ParseEvent::Completed(message) => config.name_of(message.id),
                    ParseEvent::Error(_) => None,
                };
                match &event {
                    ParseEvent::Completed(_) => completed += 1,
                    ParseEvent::Error(_) => errors += 1,
                }
                printer.push(EventRow::from_event(index, &event, name));
            }
            Err(ReadError::PayloadTooLarge { size, .. }) => {
                errors += 1;
                printer.push(EventRow::overflow(index, size));
            }
            Err(ReadError::Truncated { status, pending }) => {
                tracing::warn!(%status, pending, "input ended inside a message");
                errors += 1;
            }
            Err(ReadError::EndOfStream) => break,
            Err(err) => return Err(read_error("read failed", err)),
        }
        index += 1;

        if let Some(count) = args.count {
            if completed >= count.get() {
                break;
            }
        }
    }

    printer.finish();
    tracing::info!(completed, errors, "parse finished");

    if args.strict && errors > 0 {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

fn open_input(args: &ParseArgs) -> CliResult<Box<dyn Read>> {
    let raw: Box<dyn Read> = match &args.input {
        Some(path) if path.as_os_str() != "-" => Box::new(
            File::open(path).map_err(|err| io_error(&format!("open {}", path.display()), err))?,
        ),
        _ => Box::new(std::io::stdin().lock()),
    };

    if !args.hex {
        return Ok(raw);
    }

    let mut text = String::new();
    let mut raw = raw;
    raw.read_to_string(&mut text)
        .map_err(|err| io_error("read hex input", err))?;
    let bytes = decode_hex(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("hex input: {err}")))?;
    Ok(Box::new(Cursor::new(bytes)))
}

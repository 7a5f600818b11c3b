use crate::cmd::{load_config, CheckArgs};
use crate::exit::{config_error, CliResult, SUCCESS};
use crate::output::{print_descriptors, DescriptorRow, OutputFormat};

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let config = load_config(&args.config)?;
    let table = config
        .build_table()
        .map_err(|err| config_error("config", err))?;

    let rows: Vec<DescriptorRow> = table
        .iter()
        .map(|descriptor| DescriptorRow::new(descriptor, config.name_of(descriptor.id())))
        .collect();

    print_descriptors(config.markers(), &rows, format);
    Ok(SUCCESS)
}

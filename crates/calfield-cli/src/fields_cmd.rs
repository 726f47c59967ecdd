use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;

use calfield_core::{Calendar, TimestampFormat, ZoneRules, parse_timestamp};
use tracing::debug;

use crate::cli::FieldsArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::output::FieldsRecord;
use crate::shared::{build_calendar, format_fields, format_utc, parse_format};

pub fn run_fields(args: FieldsArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let mut calendar = build_calendar(&args.calendar)?;
    let format = parse_format(&args.format)?;

    let reader: Box<dyn BufRead> = if args.stdin || args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input).map_err(|e| {
            CliError::runtime(format!("Failed to open file '{}': {}", args.input, e))
        })?;
        Box::new(BufReader::new(file))
    };

    for line in reader.lines() {
        let line = line.map_err(|e| CliError::runtime(format!("Failed to read line: {}", e)))?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let record = process_fields_line(trimmed, &mut calendar, format)
            .map_err(|e| CliError::input(format!("Error processing '{}': {}", trimmed, e)))?;

        match output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string(&record)
                    .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
                println!("{}", json);
            }
            OutputFormat::Text => {
                println!("{} -> {}", record.input, format_fields(&record.fields));
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

fn process_fields_line(
    input: &str,
    calendar: &mut Calendar,
    format: TimestampFormat,
) -> CliResult<FieldsRecord> {
    let epoch_ms = parse_timestamp(input, format)?;
    calendar.set_time_in_millis(epoch_ms);
    let fields = calendar.fields()?;
    debug!(epoch_ms, ?fields, "Computed fields");

    Ok(FieldsRecord {
        input: input.to_string(),
        epoch_ms,
        utc: format_utc(epoch_ms),
        calendar: calendar.system().name(),
        tz: calendar.zone().id().to_string(),
        fields,
    })
}

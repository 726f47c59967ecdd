use std::process::ExitCode;

use calfield_core::{Field, ZoneRules};
use tracing::debug;

use crate::cli::StepArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::output::{StepRecord, StepReport};
use crate::shared::{build_calendar, format_fields, format_utc, parse_instant};

pub fn run_step(args: StepArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let mut calendar = build_calendar(&args.calendar)?;
    let field: Field = args.field.parse()?;
    let start = parse_instant(&args.start)?;
    calendar.set_time_in_millis(start);

    let operation = if args.roll { "roll" } else { "add" };
    let mut steps = Vec::with_capacity(args.count as usize);
    let mut lines = Vec::with_capacity(args.count as usize);

    for step in 1..=args.count {
        if args.roll {
            calendar.roll(field, args.amount)?;
        } else {
            calendar.add(field, args.amount)?;
        }
        let epoch_ms = calendar.time_in_millis()?;
        let fields = calendar.fields()?;
        debug!(step, epoch_ms, "{} {} by {}", operation, field, args.amount);

        lines.push(format!("{:>4} {} ({})", step, format_fields(&fields), epoch_ms));
        steps.push(StepRecord::new(step, epoch_ms, format_utc(epoch_ms), &fields, field));
    }

    match output_format {
        OutputFormat::Json => {
            let report = StepReport {
                calendar: calendar.system().name(),
                tz: calendar.zone().id().to_string(),
                operation,
                field,
                amount: args.amount,
                start,
                start_utc: format_utc(start),
                steps,
            };
            let json = serde_json::to_string(&report)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for line in lines {
                println!("{}", line);
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

use std::process::ExitCode;

use calfield_core::{ZoneRules, parse_assignment};
use tracing::{debug, info};

use crate::cli::ResolveArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::output::{Assignment, ResolveRecord};
use crate::shared::{build_calendar, format_fields, format_utc};

pub fn run_resolve(args: ResolveArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let mut calendar = build_calendar(&args.calendar)?;
    calendar.clear_all();

    let mut assignments = Vec::with_capacity(args.set.len());
    for text in &args.set {
        let (field, value) = parse_assignment(text)?;
        debug!(%field, value, "Setting field");
        calendar.set(field, value);
        assignments.push(Assignment { field, value });
    }

    let epoch_ms = calendar.time_in_millis()?;
    let fields = calendar.fields()?;
    info!(epoch_ms, "Resolved {} assignments", assignments.len());

    let record = ResolveRecord {
        assignments,
        calendar: calendar.system().name(),
        tz: calendar.zone().id().to_string(),
        lenient: calendar.is_lenient(),
        epoch_ms,
        utc: format_utc(epoch_ms),
        fields,
    };

    match output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string(&record)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("{} ({})", format_fields(&record.fields), epoch_ms);
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

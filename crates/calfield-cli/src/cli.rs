use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Calendar field inspection and arithmetic tool
#[derive(Parser, Debug)]
#[command(name = "calfield", version)]
#[command(about = "Calendar field inspection and arithmetic tool")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print calendar fields for timestamps
    Fields(FieldsArgs),
    /// Resolve field assignments to an instant
    Resolve(ResolveArgs),
    /// Repeatedly add or roll a field
    Step(StepArgs),
}

/// Options shared by every command that builds a calendar.
#[derive(clap::Args, Debug, Default)]
pub struct CalendarArgs {
    /// JSON calendar config file; other options override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// IANA timezone or fixed offset (e.g., Europe/Berlin, +05:30)
    #[arg(short, long)]
    pub tz: Option<String>,

    /// Calendar system: gregorian, hybrid, japanese
    #[arg(short, long)]
    pub calendar: Option<String>,

    /// Julian/Gregorian cutover instant (hybrid only)
    #[arg(long, allow_hyphen_values = true)]
    pub cutover: Option<String>,

    /// Locale tag selecting week rules (e.g., en-US, de-DE)
    #[arg(long)]
    pub locale: Option<String>,

    /// First day of week, 1 (Sunday) to 7 (Saturday)
    #[arg(long)]
    pub first_day_of_week: Option<i32>,

    /// Minimal days in the first week, 1 to 7
    #[arg(long)]
    pub min_days: Option<i32>,

    /// Reject out-of-range and inconsistent field values
    #[arg(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub calendar: CalendarArgs,

    /// Input format: epoch_ms, epoch_s, rfc3339
    #[arg(short = 'f', long, default_value = "epoch_ms")]
    pub format: String,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,

    /// Input file path (use - for stdin)
    #[arg(long, default_value = "-")]
    pub input: String,

    /// Read from stdin
    #[arg(long)]
    pub stdin: bool,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub calendar: CalendarArgs,

    /// Field assignment FIELD=VALUE, applied in order
    #[arg(short, long = "set", required = true, allow_hyphen_values = true)]
    pub set: Vec<String>,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct StepArgs {
    #[command(flatten)]
    pub calendar: CalendarArgs,

    /// Start instant (epoch ms, epoch s or RFC3339, auto-detected)
    #[arg(long, allow_hyphen_values = true)]
    pub start: String,

    /// Field to step (e.g., MONTH, day_of_month)
    #[arg(long)]
    pub field: String,

    /// Amount per step
    #[arg(long, allow_hyphen_values = true)]
    pub amount: i32,

    /// Number of steps
    #[arg(long, default_value_t = 1)]
    pub count: u32,

    /// Roll within the field's range instead of adding
    #[arg(long)]
    pub roll: bool,

    /// Output format: json, text
    #[arg(long, default_value = "json")]
    pub output_format: String,
}

//! JSON output records.

use calfield_core::{Field, FieldValues};
use serde::Serialize;

/// Fields of one input timestamp.
#[derive(Debug, Serialize)]
pub struct FieldsRecord {
    pub input: String,
    pub epoch_ms: i64,
    pub utc: Option<String>,
    pub calendar: &'static str,
    pub tz: String,
    pub fields: FieldValues,
}

#[derive(Debug, Serialize)]
pub struct Assignment {
    pub field: Field,
    pub value: i32,
}

/// Result of resolving a sequence of assignments.
#[derive(Debug, Serialize)]
pub struct ResolveRecord {
    pub assignments: Vec<Assignment>,
    pub calendar: &'static str,
    pub tz: String,
    pub lenient: bool,
    pub epoch_ms: i64,
    pub utc: Option<String>,
    pub fields: FieldValues,
}

/// Date and time summary after one step.
#[derive(Debug, Serialize)]
pub struct StepRecord {
    pub step: u32,
    pub epoch_ms: i64,
    pub utc: Option<String>,
    pub era: i32,
    pub year: i32,
    pub month: i32,
    pub day_of_month: i32,
    pub day_of_week: i32,
    pub hour_of_day: i32,
    pub minute: i32,
    pub second: i32,
    pub millisecond: i32,
    /// Value of the stepped field.
    pub value: i32,
}

impl StepRecord {
    pub fn new(step: u32, epoch_ms: i64, utc: Option<String>, fields: &FieldValues, field: Field) -> Self {
        StepRecord {
            step,
            epoch_ms,
            utc,
            era: fields.era,
            year: fields.year,
            month: fields.month,
            day_of_month: fields.day_of_month,
            day_of_week: fields.day_of_week,
            hour_of_day: fields.hour_of_day,
            minute: fields.minute,
            second: fields.second,
            millisecond: fields.millisecond,
            value: fields.get(field),
        }
    }
}

/// All steps of one `step` invocation.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub calendar: &'static str,
    pub tz: String,
    pub operation: &'static str,
    pub field: Field,
    pub amount: i32,
    pub start: i64,
    pub start_utc: Option<String>,
    pub steps: Vec<StepRecord>,
}

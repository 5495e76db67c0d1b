//! Itinerary validator
//!
//! Turns the generator's raw text into an [`Itinerary`]. The default lenient
//! mode only checks that the text is a non-empty JSON array; the elements are
//! kept as parsed, with no field checks. Strict mode is opt-in and
//! additionally requires the schema's required fields with their JSON types.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::domain::{Activity, Itinerary, ItineraryDay};
use crate::error::ValidationError;

/// How much of the itinerary shape is enforced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    mode: ValidationMode,
}

impl Validator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn lenient() -> Self {
        Self::new(ValidationMode::Lenient)
    }

    pub fn strict() -> Self {
        Self::new(ValidationMode::Strict)
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Parse and check raw generator output
    pub fn validate(&self, raw: &str) -> Result<Itinerary, ValidationError> {
        debug!(mode = ?self.mode, len = raw.len(), "validate: called");

        let value: Value = serde_json::from_str(raw).map_err(|e| {
            debug!(error = %e, "validate: not JSON");
            ValidationError::Unparseable(e.to_string())
        })?;

        let days = match value {
            Value::Array(days) => days,
            other => {
                debug!(kind = json_kind(&other), "validate: not an array");
                return Err(ValidationError::EmptyOrMalformed(format!(
                    "expected an array of days, got {}",
                    json_kind(&other)
                )));
            }
        };
        if days.is_empty() {
            debug!("validate: empty array");
            return Err(ValidationError::EmptyOrMalformed("itinerary has no days".to_string()));
        }

        let itinerary = Itinerary::new(days.into_iter().map(ItineraryDay::from).collect());

        if self.mode == ValidationMode::Strict {
            check_required_fields(&itinerary)?;
        }

        debug!(days = itinerary.len(), "validate: ok");
        Ok(itinerary)
    }
}

fn check_required_fields(itinerary: &Itinerary) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (index, day) in itinerary.days().iter().enumerate() {
        let position = index + 1;
        if !day.as_value().is_object() {
            return Err(ValidationError::EmptyOrMalformed(format!(
                "day {} is {}, expected an object",
                position,
                json_kind(day.as_value())
            )));
        }
        let number = day.day_number().ok_or_else(|| {
            ValidationError::EmptyOrMalformed(format!("day {} has no positive day number", position))
        })?;
        if !seen.insert(number) {
            return Err(ValidationError::EmptyOrMalformed(format!(
                "day number {} appears more than once",
                number
            )));
        }
        if day.date().is_none_or(|d| d.trim().is_empty()) {
            return Err(ValidationError::EmptyOrMalformed(format!("day {} has no date", number)));
        }
        if !day.has_activities() {
            return Err(ValidationError::EmptyOrMalformed(format!("day {} has no activities", number)));
        }
        for activity in day.activities() {
            check_activity(number, activity)?;
        }
    }
    Ok(())
}

fn check_activity(day: u32, activity: Activity<'_>) -> Result<(), ValidationError> {
    if !activity.is_complete() || activity.time().is_none() {
        return Err(ValidationError::EmptyOrMalformed(format!(
            "day {} has an activity missing time, name or description",
            day
        )));
    }
    for key in ["estimatedCost", "location"] {
        if let Some(value) = activity.field(key).filter(|v| !v.is_string()) {
            return Err(ValidationError::EmptyOrMalformed(format!(
                "day {} has an activity whose {} is {}, expected a string",
                day,
                key,
                json_kind(value)
            )));
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

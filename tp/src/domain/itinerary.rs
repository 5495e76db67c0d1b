//! Itinerary types returned by the generation pipeline
//!
//! Days are kept as the JSON values the generator produced, so a stored
//! itinerary re-encodes field-for-field, nulls and unexpected types included.
//! Typed accessors read through that value and return `None` for a field that
//! is missing or not of the expected JSON type; the gaps surface as
//! placeholder text when rendered.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Read-only view of one activity within a day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity<'a>(&'a Value);

impl<'a> Activity<'a> {
    /// Raw field value, whatever its JSON type
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key)
    }

    fn text(&self, key: &str) -> Option<&'a str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Suggested time slot, e.g. "9:00 AM - 11:00 AM"
    pub fn time(&self) -> Option<&'a str> {
        self.text("time")
    }

    pub fn name(&self) -> Option<&'a str> {
        self.text("name")
    }

    pub fn description(&self) -> Option<&'a str> {
        self.text("description")
    }

    /// Free-text cost, e.g. "€25" or "Free"
    pub fn estimated_cost(&self) -> Option<&'a str> {
        self.text("estimatedCost")
    }

    /// Free-form place reference suitable for a map search
    pub fn location(&self) -> Option<&'a str> {
        self.text("location")
    }

    /// Name and description both present and non-blank
    pub fn is_complete(&self) -> bool {
        let present = |field: Option<&str>| field.is_some_and(|s| !s.trim().is_empty());
        present(self.name()) && present(self.description())
    }

    pub fn as_value(&self) -> &'a Value {
        self.0
    }
}

/// One day of an itinerary, exactly as the generator wrote it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItineraryDay(Value);

impl ItineraryDay {
    pub fn new(day: u32, date: impl Into<String>, activities: Vec<Value>) -> Self {
        Self(json!({
            "day": day,
            "date": date.into(),
            "activities": activities,
        }))
    }

    /// Raw field value, whatever its JSON type
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Day number as written, for display
    pub fn day(&self) -> Option<&Value> {
        self.field("day").filter(|v| !v.is_null())
    }

    /// Day number when it is a positive whole number
    pub fn day_number(&self) -> Option<u32> {
        self.field("day")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
    }

    /// Calendar date, ISO-8601 expected but not checked
    pub fn date(&self) -> Option<&str> {
        self.field("date").and_then(Value::as_str)
    }

    /// Whether the day carries an activities array, even an empty one
    pub fn has_activities(&self) -> bool {
        self.field("activities").is_some_and(Value::is_array)
    }

    /// Activities in generator order; empty when the field is absent or not an array
    pub fn activities(&self) -> Vec<Activity<'_>> {
        self.field("activities")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Activity).collect())
            .unwrap_or_default()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for ItineraryDay {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Ordered sequence of days, displayed in the order the generator gave them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Itinerary(Vec<ItineraryDay>);

impl Itinerary {
    pub fn new(days: Vec<ItineraryDay>) -> Self {
        Self(days)
    }

    pub fn days(&self) -> &[ItineraryDay] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Day at a display position
    pub fn day_at(&self, index: usize) -> Option<&ItineraryDay> {
        self.0.get(index)
    }

    /// Total number of activities across all days
    pub fn activity_count(&self) -> usize {
        self.0.iter().map(|d| d.activities().len()).sum()
    }

    /// Encode as the JSON text stored alongside saved plans
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

//! Itinerary request builder
//!
//! Turns [`TripCriteria`] into a provider-agnostic [`GenerationRequest`]: the
//! prompt text plus the machine-checkable output schema. Building is a pure
//! transform; criteria are validated before they get here.

use serde_json::{Value, json};
use tracing::debug;

use crate::domain::TripCriteria;

/// MIME type requested for generator output
pub const RESPONSE_MIME_TYPE: &str = "application/json";

/// Prompt and output schema for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub schema: Value,
}

/// Build the generation request for a set of criteria
pub fn build_request(criteria: &TripCriteria) -> GenerationRequest {
    debug!(destination = %criteria.destination, "build_request: called");
    GenerationRequest {
        prompt: build_prompt(criteria),
        schema: itinerary_schema(),
    }
}

/// Prompt text embedding each criteria field once, followed by the output shape
pub fn build_prompt(criteria: &TripCriteria) -> String {
    format!(
        "Create a detailed day-by-day trip itinerary for these criteria:\n\
         Destination: {destination}\n\
         Start Date: {start}\n\
         End Date: {end}\n\
         Interests: {interests}\n\
         Budget: {budget}\n\
         \n\
         {shape}",
        destination = criteria.destination,
        start = criteria.start_date.format(crate::domain::DATE_FORMAT),
        end = criteria.end_date.format(crate::domain::DATE_FORMAT),
        interests = criteria.interests_joined(),
        budget = criteria.budget,
        shape = OUTPUT_INSTRUCTIONS,
    )
}

const OUTPUT_INSTRUCTIONS: &str = r#"Return the itinerary as a JSON array with one element per day.
Each day object has:
- "day": (number) the day number, starting at 1
- "date": (string) the calendar date as YYYY-MM-DD
- "activities": (array of objects) the activities for that day, in order.
  Each activity object has:
  - "time": (string) a suggested time slot
  - "name": (string) the name of the activity or place
  - "description": (string) a short description of the activity
  - "estimatedCost": (string) an estimated cost for one person
  - "location": (string) a landmark or place name suitable for a map search

Example of the structure:
[
  {
    "day": 1,
    "date": "YYYY-MM-DD",
    "activities": [
      {
        "time": "<time slot>",
        "name": "<activity name>",
        "description": "<what to do there>",
        "estimatedCost": "<cost>",
        "location": "<landmark, city>"
      }
    ]
  }
]

Plan every day of the trip, from the first date through the last."#;

/// Output schema mirroring the itinerary shape
///
/// `day`, `date` and `activities` are required on each day; `time`, `name`
/// and `description` are required on each activity.
pub fn itinerary_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "day": { "type": "NUMBER" },
                "date": { "type": "STRING" },
                "activities": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "time": { "type": "STRING" },
                            "name": { "type": "STRING" },
                            "description": { "type": "STRING" },
                            "estimatedCost": { "type": "STRING" },
                            "location": { "type": "STRING" }
                        },
                        "required": ["time", "name", "description"]
                    }
                }
            },
            "required": ["day", "date", "activities"]
        }
    })
}

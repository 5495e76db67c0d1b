//! Trip criteria - the user inputs that drive itinerary generation

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Interests offered for selection; free-form interests are also accepted
pub const PREDEFINED_INTERESTS: &[&str] = &[
    "Adventure",
    "Art & Culture",
    "Beaches",
    "City Exploration",
    "Cruises",
    "Family Fun",
    "Food & Drink",
    "History",
    "Hiking",
    "Nature",
    "Nightlife",
    "Relaxation",
    "Shopping",
    "Skiing",
    "Wildlife",
];

/// Date format used for criteria and stored plans
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Problems with raw criteria input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
    #[error("Destination is required")]
    EmptyDestination,

    #[error("Invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Inputs for a generation request
///
/// Construct through [`TripCriteria::new`] or [`TripCriteria::parse`] so the
/// destination is present and the date range is not inverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripCriteria {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub interests: Vec<String>,
    pub budget: String,
}

impl TripCriteria {
    /// Build validated criteria
    pub fn new(
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        interests: Vec<String>,
        budget: impl Into<String>,
    ) -> Result<Self, CriteriaError> {
        let criteria = Self {
            destination: destination.into().trim().to_string(),
            start_date,
            end_date,
            interests,
            budget: budget.into(),
        };
        criteria.validate()?;
        Ok(criteria)
    }

    /// Build validated criteria from text dates
    pub fn parse(
        destination: &str,
        start_date: &str,
        end_date: &str,
        interests: Vec<String>,
        budget: &str,
    ) -> Result<Self, CriteriaError> {
        debug!(%destination, %start_date, %end_date, "TripCriteria::parse: called");
        let start = parse_date("start date", start_date)?;
        let end = parse_date("end date", end_date)?;
        Self::new(destination, start, end, interests, budget)
    }

    /// Check the invariants the generation pipeline relies on
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.destination.trim().is_empty() {
            debug!("TripCriteria::validate: empty destination");
            return Err(CriteriaError::EmptyDestination);
        }
        if self.end_date < self.start_date {
            debug!(start = %self.start_date, end = %self.end_date, "TripCriteria::validate: inverted range");
            return Err(CriteriaError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Interests joined the way they appear in prompts and listings
    pub fn interests_joined(&self) -> String {
        self.interests.join(", ")
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, CriteriaError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| CriteriaError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

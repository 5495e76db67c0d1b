//! Domain types for trip planning

mod criteria;
mod itinerary;

pub use criteria::{CriteriaError, DATE_FORMAT, PREDEFINED_INTERESTS, TripCriteria, parse_date};
pub use itinerary::{Activity, Itinerary, ItineraryDay};

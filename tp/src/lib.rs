//! TripPlanner - AI trip itinerary pipeline
//!
//! Turns trip criteria into a day-by-day itinerary by prompting a generative
//! model for schema-constrained JSON, validating what comes back, and saving
//! accepted plans to a per-user collection.
//!
//! # Modules
//!
//! - [`domain`] - Trip criteria and itinerary types
//! - [`request`] - Prompt and output schema builder
//! - [`generation`] - Generation client trait and Gemini implementation
//! - [`retry`] - Bounded retry with backoff for generation calls and saves
//! - [`validator`] - Raw output to itinerary, lenient or strict
//! - [`store`] - Plan store adapter seam over the `planstore` crate
//! - [`session`] - Pipeline state machine
//! - [`render`] - Text and JSON output
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod generation;
pub mod render;
pub mod request;
pub mod retry;
pub mod session;
pub mod store;
pub mod validator;

pub use config::Config;
pub use domain::{Activity, CriteriaError, Itinerary, ItineraryDay, TripCriteria};
pub use error::{ConfigurationError, PlannerError, ValidationError};
pub use generation::{GeminiClient, GenerationClient, GenerationError, create_client};
pub use request::{GenerationRequest, build_request, itinerary_schema};
pub use retry::RetryPolicy;
pub use session::{Phase, PlanListUpdate, PlannerSession, SessionSnapshot};
pub use store::PlanStoreAdapter;
pub use validator::{ValidationMode, Validator};

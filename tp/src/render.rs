//! Terminal and JSON rendering of itineraries and saved plans

use colored::Colorize;
use planstore::SavedPlan;
use reqwest::Url;
use serde_json::{Value, json};

use crate::domain::{Activity, Itinerary, ItineraryDay, TripCriteria};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Map search link for a free-form location
pub fn maps_link(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", location)])
        .ok()
        .map(String::from)
}

/// Criteria summary line, e.g. "Paris, 2025-07-15 to 2025-07-16 (medium budget)"
pub fn criteria_summary(criteria: &TripCriteria) -> String {
    let mut summary = format!(
        "{}, {} to {} ({} budget)",
        criteria.destination, criteria.start_date, criteria.end_date, criteria.budget
    );
    if !criteria.interests.is_empty() {
        summary.push_str(&format!(" - {}", criteria.interests_joined()));
    }
    summary
}

/// Render an itinerary as text; `only_day` limits output to one position
pub fn render_itinerary(criteria: Option<&TripCriteria>, itinerary: &Itinerary, only_day: Option<usize>) -> String {
    let mut out = String::new();
    if let Some(criteria) = criteria {
        out.push_str(&format!("{}\n", "Trip itinerary".bright_cyan().bold()));
        out.push_str(&format!("{}\n\n", criteria_summary(criteria).dimmed()));
    }

    for (index, day) in itinerary.days().iter().enumerate() {
        if only_day.is_some_and(|only| only != index) {
            continue;
        }
        out.push_str(&render_day(index, day));
        out.push('\n');
    }
    out
}

/// Render one day; `index` is its display position
pub fn render_day(index: usize, day: &ItineraryDay) -> String {
    let number = day
        .day()
        .and_then(scalar_text)
        .unwrap_or_else(|| (index + 1).to_string());
    let date = day.date().unwrap_or("Date not specified");

    let mut out = format!("{} {}\n", format!("Day {}", number).green().bold(), format!("({})", date).dimmed());
    let activities = day.activities();
    if activities.is_empty() {
        out.push_str(&format!("  {}\n", "No activities planned".dimmed()));
    }
    for activity in activities {
        out.push_str(&render_activity(activity));
    }
    out
}

fn render_activity(activity: Activity<'_>) -> String {
    let time = activity.time().unwrap_or("Time not specified");
    let name = activity.name().unwrap_or("Unnamed activity");
    let description = activity.description().unwrap_or("No description provided");

    let mut out = format!("  {} {}\n", time.yellow(), name.bold());
    out.push_str(&format!("    {}\n", description));
    if let Some(cost) = activity.field("estimatedCost").and_then(scalar_text) {
        out.push_str(&format!("    Cost: {}\n", cost));
    }
    if let Some(location) = activity.location() {
        out.push_str(&format!("    Location: {}\n", location));
        if let Some(link) = maps_link(location) {
            out.push_str(&format!("    Map: {}\n", link.blue().underline()));
        }
    }
    out
}

/// Display text for a string or number field
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JSON document for an itinerary and the criteria that produced it
pub fn itinerary_json(criteria: Option<&TripCriteria>, itinerary: &Itinerary, only_day: Option<usize>) -> Value {
    let days: Vec<&ItineraryDay> = match only_day {
        Some(index) => itinerary.day_at(index).into_iter().collect(),
        None => itinerary.days().iter().collect(),
    };
    json!({
        "criteria": criteria,
        "itinerary": days,
    })
}

/// Render the saved-plan list as text, newest first
pub fn render_plan_list(plans: &[SavedPlan]) -> String {
    if plans.is_empty() {
        return format!("{}\n", "No saved plans yet.".dimmed());
    }

    let mut out = String::new();
    for plan in plans {
        let created = plan
            .created()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        out.push_str(&format!(
            "{}  {}  {} to {}  {}\n",
            plan.id.cyan(),
            plan.record.destination.bold(),
            plan.record.start_date,
            plan.record.end_date,
            format!("saved {}", created).dimmed()
        ));
    }
    out
}

/// JSON array of saved plans
pub fn plan_list_json(plans: &[SavedPlan]) -> Value {
    json!(plans)
}

use crate::types::{EventCategory, ProbabilityResult};

/// Returns the first category, in priority order, whose keyword occurs in `event`.
pub fn classify(event: &str) -> Option<EventCategory> {
    let event = event.to_lowercase();
    EventCategory::PRIORITY
        .into_iter()
        .find(|category| event.contains(category.keyword()))
}

pub fn resolve(event: &str) -> ProbabilityResult {
    match classify(event) {
        Some(category) => ProbabilityResult::Known(category.probability()),
        None => ProbabilityResult::Unknown,
    }
}

// ============================================================================
// EVENT CATEGORIES
// ============================================================================

/// Recognized events, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Coin,
    Dice,
    Lottery,
}

impl EventCategory {
    pub const PRIORITY: [EventCategory; 3] =
        [EventCategory::Coin, EventCategory::Dice, EventCategory::Lottery];

    pub fn keyword(self) -> &'static str {
        match self {
            EventCategory::Coin => "coin",
            EventCategory::Dice => "dice",
            EventCategory::Lottery => "lottery",
        }
    }

    pub fn probability(self) -> f64 {
        match self {
            EventCategory::Coin => 0.5,
            EventCategory::Dice => 1.0 / 6.0,
            EventCategory::Lottery => 1.0 / 292_000_000.0,
        }
    }
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbabilityResult {
    Known(f64),
    Unknown,
}

impl ProbabilityResult {
    pub fn value(self) -> Option<f64> {
        match self {
            ProbabilityResult::Known(value) => Some(value),
            ProbabilityResult::Unknown => None,
        }
    }
}

/// JSON shape used when a result crosses the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `{"probability": 0.5}` or `{"probability": "unknown event"}`.
    Legacy,
    /// `{"known": true, "probability": 0.5}` or `{"known": false, "probability": null}`.
    Tagged,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Legacy => "legacy",
            ResponseFormat::Tagged => "tagged",
        }
    }
}

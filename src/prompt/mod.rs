// src/prompt/mod.rs — Prompt interpretation: free text → structured hints
//
// Best-effort extraction only. Absent signals become None; this module
// never fails on any input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Unit conversion factors to meters.
const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_CM: f64 = 0.01;

/// Structured hints extracted from a free-text prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptHints {
    pub footprint: Option<ExtractedFootprint>,
    pub budget: Option<f64>,
    pub city: Option<String>,
    pub style: Option<String>,
    pub building_type: Option<String>,
}

/// Width/length (and optionally height) extracted from the prompt,
/// normalized to meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFootprint {
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: Option<f64>,
}

// Ordered dimension patterns. The first match wins.
static DIM_X: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:x|×)\s*(\d+(?:\.\d+)?)\s*(m|meters?|metres?|ft|feet|foot|cm|centimeters?)\b").unwrap()
});
static DIM_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s+by\s+(\d+(?:\.\d+)?)\s*(m|meters?|metres?|ft|feet|foot|cm|centimeters?)\b").unwrap()
});
static DIM_LENGTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)length\s+(?:of\s+)?(\d+(?:\.\d+)?)\s*(m|meters?|metres?|ft|feet|foot|cm|centimeters?)\b").unwrap()
});

static BUDGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:[$€£]\s*|budget\s+(?:of\s+|is\s+|:\s*)?[$€£]?|(?:under|around|about)\s+[$€£])(\d[\d,]*(?:\.\d+)?)\s*(k)?").unwrap()
});

/// Closed vocabularies for keyword lookup. Unmatched text yields None.
const CITIES: &[&str] = &[
    "amsterdam",
    "rotterdam",
    "utrecht",
    "eindhoven",
    "berlin",
    "munich",
    "london",
    "paris",
    "madrid",
    "milan",
    "new york",
    "dubai",
    "singapore",
    "tokyo",
];

const STYLES: &[&str] = &[
    "modern",
    "minimalist",
    "industrial",
    "scandinavian",
    "rustic",
    "classic",
    "bohemian",
    "art deco",
    "mediterranean",
];

const BUILDING_TYPES: &[&str] = &[
    "living room",
    "bedroom",
    "kitchen",
    "bathroom",
    "office",
    "studio",
    "apartment",
    "house",
    "villa",
];

/// Parse a prompt into structured hints.
pub fn interpret(prompt: &str) -> PromptHints {
    PromptHints {
        footprint: extract_dimensions(prompt),
        budget: extract_budget(prompt),
        city: lookup(prompt, CITIES),
        style: lookup(prompt, STYLES),
        building_type: lookup(prompt, BUILDING_TYPES),
    }
}

fn unit_factor(unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "ft" | "feet" | "foot" => METERS_PER_FOOT,
        "cm" | "centimeter" | "centimeters" => METERS_PER_CM,
        _ => 1.0,
    }
}

/// Apply the ordered pattern list and return the first match, unit-normalized.
fn extract_dimensions(prompt: &str) -> Option<ExtractedFootprint> {
    for re in [&*DIM_X, &*DIM_BY] {
        if let Some(caps) = re.captures(prompt) {
            let w: f64 = caps[1].parse().ok()?;
            let l: f64 = caps[2].parse().ok()?;
            let f = unit_factor(&caps[3]);
            return Some(ExtractedFootprint {
                width_m: w * f,
                length_m: l * f,
                height_m: None,
            });
        }
    }

    // Length-only prompts describe a square footprint.
    if let Some(caps) = DIM_LENGTH.captures(prompt) {
        let n: f64 = caps[1].parse().ok()?;
        let f = unit_factor(&caps[2]);
        return Some(ExtractedFootprint {
            width_m: n * f,
            length_m: n * f,
            height_m: None,
        });
    }

    None
}

/// First currency-like numeric token. A trailing `k` multiplies by 1000.
fn extract_budget(prompt: &str) -> Option<f64> {
    let caps = BUDGET.captures(prompt)?;
    let raw = caps[1].replace(',', "");
    let mut value: f64 = raw.parse().ok()?;
    if caps.get(2).is_some() {
        value *= 1000.0;
    }
    Some(value)
}

fn lookup(prompt: &str, vocabulary: &[&str]) -> Option<String> {
    let lower = prompt.to_lowercase();
    vocabulary
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
}

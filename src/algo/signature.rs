//! Wildcard keyword signature derivation (§4.3). Deterministic: a pure
//! function of the normalized point plus the caller-supplied object type.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::config::SignatureConfig;
use crate::model::{ConfidenceLevel, NormalizedPoint, ObjectType, PointFunction, PointSignature};

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "of", "for", "and", "or", "in", "on", "at", "to", "is", "are", "by",
        "with",
    ]
    .into_iter()
    .collect()
});

static TEMPERATURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^temp(erature)?$").unwrap());
static PRESSURE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^pressure$").unwrap());
static FLOW_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^flow$").unwrap());
static SETPOINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^set ?point$").unwrap());
static POSITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^position$").unwrap());
static STATUS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^status$").unwrap());
static COMMAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^command$").unwrap());
static SENSOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sensor$").unwrap());
static DAMPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^damper$").unwrap());
static VALVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^valve$").unwrap());
static FAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^fan$").unwrap());
static ROOM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(room|zone)$").unwrap());
static SUPPLY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^supply$").unwrap());
static RETURN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^return$").unwrap());
static EXHAUST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^exhaust$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum KeywordTier {
    MeasurementOrFunction,
    Equipment,
    Location,
    Passthrough,
}

fn canonicalize(token: &str) -> Option<(&'static str, KeywordTier)> {
    if TEMPERATURE_RE.is_match(token) {
        Some(("temperature", KeywordTier::MeasurementOrFunction))
    } else if PRESSURE_RE.is_match(token) {
        Some(("pressure", KeywordTier::MeasurementOrFunction))
    } else if FLOW_RE.is_match(token) {
        Some(("flow", KeywordTier::MeasurementOrFunction))
    } else if SETPOINT_RE.is_match(token) {
        Some(("setpoint", KeywordTier::MeasurementOrFunction))
    } else if POSITION_RE.is_match(token) {
        Some(("position", KeywordTier::MeasurementOrFunction))
    } else if STATUS_RE.is_match(token) {
        Some(("status", KeywordTier::MeasurementOrFunction))
    } else if COMMAND_RE.is_match(token) {
        Some(("command", KeywordTier::MeasurementOrFunction))
    } else if SENSOR_RE.is_match(token) {
        Some(("sensor", KeywordTier::MeasurementOrFunction))
    } else if DAMPER_RE.is_match(token) {
        Some(("damper", KeywordTier::Equipment))
    } else if VALVE_RE.is_match(token) {
        Some(("valve", KeywordTier::Equipment))
    } else if FAN_RE.is_match(token) {
        Some(("fan", KeywordTier::Equipment))
    } else if ROOM_RE.is_match(token) {
        Some(("room", KeywordTier::Location))
    } else if SUPPLY_RE.is_match(token) {
        Some(("supply", KeywordTier::Location))
    } else if RETURN_RE.is_match(token) {
        Some(("return", KeywordTier::Location))
    } else if EXHAUST_RE.is_match(token) {
        Some(("exhaust", KeywordTier::Location))
    } else {
        None
    }
}

fn extract_keywords(normalized_name: &str, min_keyword_length: usize) -> Vec<(String, KeywordTier)> {
    let lower = normalized_name.to_lowercase();
    let scrubbed: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut out = Vec::new();
    for token in scrubbed.split_whitespace() {
        if token.len() < min_keyword_length || STOPWORDS.contains(token) {
            continue;
        }
        if let Some((canonical, tier)) = canonicalize(token) {
            out.push((canonical.to_string(), tier));
        } else if token.len() >= 3 {
            out.push((token.to_string(), KeywordTier::Passthrough));
        }
    }
    out
}

/// `signature(np, objectType, opts) → PointSignature` (§4.3).
pub fn signature(
    np: &NormalizedPoint,
    object_type: Option<ObjectType>,
    cfg: &SignatureConfig,
) -> PointSignature {
    let mut extracted = extract_keywords(&np.normalized_name, cfg.min_keyword_length);
    extracted.sort_by_key(|(_, tier)| *tier);
    extracted.truncate(cfg.max_wildcards);

    let keywords: Vec<String> = extracted.iter().map(|(k, _)| k.clone()).collect();
    let technical_count = extracted
        .iter()
        .filter(|(_, t)| *t == KeywordTier::MeasurementOrFunction)
        .count();

    let pattern = if keywords.is_empty() {
        "*UNKNOWN*".to_string()
    } else {
        format!(
            "*{}*",
            keywords
                .iter()
                .map(|k| k.to_uppercase())
                .collect::<Vec<_>>()
                .join("*")
        )
    };
    let normalized_pattern = pattern.replace('*', "");

    let mut confidence = 0.50;
    confidence += (keywords.len() as f64 / 4.0).min(1.0) * 0.30;
    if np.point_function != PointFunction::Unknown {
        confidence += 0.20;
    }
    if np.units.is_some() {
        confidence += 0.10;
    }
    if object_type.is_some() {
        confidence += 0.10;
    }
    confidence += match np.confidence_level {
        ConfidenceLevel::High => 0.15,
        ConfidenceLevel::Medium => 0.10,
        ConfidenceLevel::Low | ConfidenceLevel::Unknown => 0.0,
    };
    let confidence = confidence.clamp(0.0, 1.0);

    let wildcard_count = keywords.len();
    let mut specificity: f64 = 0.50;
    specificity += (wildcard_count as f64 / 5.0).min(0.30);
    specificity += 0.10 * technical_count as f64;
    specificity += 0.05 * (5_i64 - wildcard_count as i64).max(0) as f64;
    let specificity = specificity.clamp(0.0, 1.0);

    PointSignature {
        pattern,
        normalized_pattern,
        keywords,
        confidence,
        specificity,
        point_function: np.point_function,
        object_type,
        units: np.units.clone(),
        match_count: 0,
        successful_matches: 0,
    }
}

//! Per-token dictionary cascade, context analysis, function determination,
//! and tag/confidence assembly (§4.2). `normalize` is total — it never
//! panics and never returns `Err`; internal defects are recorded on the
//! output's `errors` field instead.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::algo::dictionaries::DictionarySet;
use crate::algo::tokenizer::tokenize;
use crate::config::NormalizerConfig;
use crate::model::{
    ConfidenceLevel, ExpandedAcronym, NormalizationContext, NormalizationMethod, NormalizedPoint,
    ObjectType, PointFunction, RawPoint, Tag, TagCategory, TagSource, TokenAnalysis, TokenSource,
};

static TEMPERATURE_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)°?[cf]\b|deg|temp").unwrap());
static PRESSURE_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)psi|pa\b|inh2o|inhg|bar|press").unwrap());
static FLOW_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cfm|gpm|lps|m3h|flow").unwrap());
static PERCENTAGE_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%|pct|percent").unwrap());
static POWER_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)kw|hp|power|\bw\b").unwrap());
static HUMIDITY_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)%?rh|humidity").unwrap());
static CO2_UNIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ppm|co2").unwrap());

static SETPOINT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(sp|setp|setpt|setpoint)$").unwrap());
static COMMAND_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(cmd|cmmd|command)$").unwrap());
static STATUS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(st|stat|status|alarm|alm|fail|run)$").unwrap());
static POSITION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(pos|position)$").unwrap());
static LEVEL_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(lvl|level)$").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Unit-category name plus the leading letter a token must start with to be
/// scored at the higher (0.80) confidence for that category (§4.2.1).
fn unit_category(units: &str) -> Option<(&'static str, char)> {
    if TEMPERATURE_UNIT.is_match(units) {
        Some(("Temperature", 't'))
    } else if PRESSURE_UNIT.is_match(units) {
        Some(("Pressure", 'p'))
    } else if FLOW_UNIT.is_match(units) {
        Some(("Flow", 'f'))
    } else if PERCENTAGE_UNIT.is_match(units) {
        Some(("Percentage", 'p'))
    } else if POWER_UNIT.is_match(units) {
        Some(("Power", 'p'))
    } else if HUMIDITY_UNIT.is_match(units) {
        Some(("Humidity", 'h'))
    } else if CO2_UNIT.is_match(units) {
        Some(("Carbon Dioxide", 'c'))
    } else {
        None
    }
}

fn pattern_infer(token: &str) -> TokenAnalysis {
    let original_token = token.to_string();
    if DIGITS.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: token.to_string(),
            confidence: 1.00,
            source: TokenSource::Pattern,
            matched_acronym: None,
            expansion: None,
        };
    }
    if SETPOINT_MARKER.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: "Setpoint".to_string(),
            confidence: 0.90,
            source: TokenSource::Pattern,
            matched_acronym: Some(token.to_uppercase()),
            expansion: Some("Setpoint".to_string()),
        };
    }
    if COMMAND_MARKER.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: "Command".to_string(),
            confidence: 0.90,
            source: TokenSource::Pattern,
            matched_acronym: Some(token.to_uppercase()),
            expansion: Some("Command".to_string()),
        };
    }
    if STATUS_MARKER.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: "Status".to_string(),
            confidence: 0.85,
            source: TokenSource::Pattern,
            matched_acronym: Some(token.to_uppercase()),
            expansion: Some("Status".to_string()),
        };
    }
    if POSITION_MARKER.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: "Position".to_string(),
            confidence: 0.80,
            source: TokenSource::Pattern,
            matched_acronym: Some(token.to_uppercase()),
            expansion: Some("Position".to_string()),
        };
    }
    if LEVEL_MARKER.is_match(token) {
        return TokenAnalysis {
            original_token,
            normalized_token: "Level".to_string(),
            confidence: 0.80,
            source: TokenSource::Pattern,
            matched_acronym: Some(token.to_uppercase()),
            expansion: Some("Level".to_string()),
        };
    }
    // Unresolved: short, common function words left lowercase.
    TokenAnalysis {
        original_token: original_token.clone(),
        normalized_token: original_token.to_lowercase(),
        confidence: 0.30,
        source: TokenSource::Pattern,
        matched_acronym: None,
        expansion: None,
    }
}

/// Run the full dictionary cascade for one token: equipment → vendor →
/// general → unit-based → pattern-based. First hit wins (§4.2 step 2).
fn analyze_token(
    token: &str,
    ctx: &NormalizationContext,
    units_hint: Option<&str>,
    dict: &DictionarySet,
    cfg: &NormalizerConfig,
) -> TokenAnalysis {
    if let Some(equipment_type) = ctx.equipment_type.as_deref() {
        if let Some(entry) = dict.lookup_equipment(equipment_type, token) {
            return TokenAnalysis {
                original_token: token.to_string(),
                normalized_token: entry.expansion.clone(),
                confidence: cfg.equipment_priority_base,
                source: TokenSource::Equipment,
                matched_acronym: Some(entry.token.clone()),
                expansion: Some(entry.expansion.clone()),
            };
        }
    }

    if let Some(vendor) = ctx.vendor_name.as_deref() {
        if let Some(entry) = dict.lookup_vendor(vendor, token) {
            return TokenAnalysis {
                original_token: token.to_string(),
                normalized_token: entry.expansion.clone(),
                confidence: cfg.vendor_priority_base,
                source: TokenSource::Vendor,
                matched_acronym: Some(entry.token.clone()),
                expansion: Some(entry.expansion.clone()),
            };
        }
    }

    if let Some(entry) = dict.lookup_general(token) {
        return TokenAnalysis {
            original_token: token.to_string(),
            normalized_token: entry.expansion.clone(),
            confidence: (entry.priority as f64 * 0.10).clamp(0.0, 1.0),
            source: TokenSource::General,
            matched_acronym: Some(entry.token.clone()),
            expansion: Some(entry.expansion.clone()),
        };
    }

    if let Some(units) = units_hint {
        if let Some((category, letter)) = unit_category(units) {
            let starts_consistent = token
                .chars()
                .next()
                .map(|c| c.to_ascii_lowercase() == letter)
                .unwrap_or(false);
            return TokenAnalysis {
                original_token: token.to_string(),
                normalized_token: category.to_string(),
                confidence: if starts_consistent { 0.80 } else { 0.60 },
                source: TokenSource::Unit,
                matched_acronym: None,
                expansion: Some(category.to_string()),
            };
        }
    }

    pattern_infer(token)
}

fn is_function_marker_token(analysis: &TokenAnalysis) -> bool {
    matches!(
        analysis.normalized_token.as_str(),
        "Setpoint" | "Command" | "Status"
    )
}

fn title_case_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>()
                        + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn infer_vendor(tokens: &[String], dict: &DictionarySet) -> Option<String> {
    for (vendor, entries) in &dict.vendor {
        for token in tokens {
            if crate::algo::dictionaries::lookup_entry(entries, token).is_some() {
                return Some(vendor.clone());
            }
        }
    }
    None
}

/// Maps a unit-inference category name (the Title-Case string used for
/// name synthesis, e.g. `"Temperature"`) to its canonical short tag from
/// spec.md's measurement vocabulary. `Percentage` has no canonical
/// measurement tag of its own, so it yields `None` rather than an
/// uncategorized tag.
fn unit_category_tag(category: &str) -> Option<&'static str> {
    match category {
        "Temperature" => Some("temp"),
        "Pressure" => Some("pressure"),
        "Flow" => Some("flow"),
        "Power" => Some("power"),
        "Humidity" => Some("humidity"),
        "Carbon Dioxide" => Some("co2"),
        _ => None,
    }
}

fn tag_category_for(name: &str) -> TagCategory {
    match name {
        "air" | "water" | "steam" | "elec" => TagCategory::Substance,
        "temp" | "pressure" | "flow" | "humidity" | "power" | "level" | "co2" => {
            TagCategory::Measurement
        }
        "room" | "zone" | "supply" | "return" | "exhaust" | "outside" | "mixed" | "discharge" => {
            TagCategory::Location
        }
        "damper" | "valve" | "fan" => TagCategory::Entity,
        "status" | "sp" | "cmd" | "sensor" => TagCategory::Function,
        _ => TagCategory::Other,
    }
}

fn push_tag(tags: &mut Vec<Tag>, name: &str, category: TagCategory, confidence: f64, source: TagSource) {
    if tags.iter().any(|t| t.name == name) {
        return;
    }
    tags.push(Tag {
        name: name.to_string(),
        category,
        confidence,
        source,
    });
}

fn unknown_point(errors: Vec<String>) -> NormalizedPoint {
    NormalizedPoint {
        normalized_name: "Unknown Point".to_string(),
        expanded_description: "Unknown Point".to_string(),
        point_function: PointFunction::Unknown,
        units: None,
        tags: vec![Tag {
            name: "point".to_string(),
            category: TagCategory::Entity,
            confidence: 1.0,
            source: TagSource::Explicit,
        }],
        confidence_level: ConfidenceLevel::Unknown,
        confidence_score: 0.0,
        method: NormalizationMethod::None,
        applied_rules: vec!["input-defect-fallback".to_string()],
        expanded_acronyms: vec![],
        has_acronym_expansion: false,
        has_unit_normalization: false,
        has_context_inference: false,
        requires_manual_review: true,
        errors,
    }
}

/// `normalize(point, ctx) → NormalizedPoint` (§4.2). Total: never panics.
pub fn normalize(
    point: &RawPoint,
    ctx: &NormalizationContext,
    dict: &DictionarySet,
    cfg: &NormalizerConfig,
) -> NormalizedPoint {
    if point.display_name.trim().is_empty() && point.object_name.trim().is_empty() {
        return unknown_point(vec![]);
    }

    let primary = point.primary_source();
    let tokens = tokenize(primary);
    if tokens.is_empty() {
        return unknown_point(vec!["no tokens extracted from primary source".to_string()]);
    }

    let units_hint = ctx.units.as_deref().or(point.units.as_deref());
    let analyses: Vec<TokenAnalysis> = tokens
        .iter()
        .map(|t| analyze_token(t, ctx, units_hint, dict, cfg))
        .collect();

    let inferred_vendor = ctx.vendor_name.clone().or_else(|| infer_vendor(&tokens, dict));

    let has_setpoint_marker = tokens.iter().any(|t| SETPOINT_MARKER.is_match(t))
        || analyses.iter().any(|a| a.normalized_token == "Setpoint");
    let has_command_marker = tokens.iter().any(|t| COMMAND_MARKER.is_match(t))
        || analyses.iter().any(|a| a.normalized_token == "Command");
    let has_status_marker = tokens.iter().any(|t| STATUS_MARKER.is_match(t))
        || analyses.iter().any(|a| a.normalized_token == "Status");

    let point_function = match point.object_type {
        Some(ObjectType::AO) | Some(ObjectType::BO) | Some(ObjectType::MSO) => {
            PointFunction::Command
        }
        Some(ObjectType::AI) | Some(ObjectType::BI) | Some(ObjectType::MSI) => {
            let binary_or_multistate_input = point
                .object_type
                .map(|t| t.is_binary_or_multistate_input())
                .unwrap_or(false);
            if has_status_marker && binary_or_multistate_input {
                PointFunction::Status
            } else {
                PointFunction::Sensor
            }
        }
        Some(ObjectType::AV) | Some(ObjectType::BV) | Some(ObjectType::MSV) => {
            if has_setpoint_marker {
                PointFunction::Setpoint
            } else if point.is_writable || point.is_command {
                PointFunction::Command
            } else {
                PointFunction::Unknown
            }
        }
        None => {
            if has_setpoint_marker {
                PointFunction::Setpoint
            } else if has_command_marker {
                PointFunction::Command
            } else if has_status_marker {
                PointFunction::Status
            } else {
                PointFunction::Sensor
            }
        }
    };

    let mut name_segments = Vec::new();
    let mut expanded_acronyms = Vec::new();
    let mut has_acronym_expansion = false;
    let mut has_unit_normalization = false;

    for (token, analysis) in tokens.iter().zip(analyses.iter()) {
        if analysis.source == TokenSource::Unit {
            has_unit_normalization = true;
        }
        if matches!(
            analysis.source,
            TokenSource::General | TokenSource::Equipment | TokenSource::Vendor
        ) {
            has_acronym_expansion = true;
            if let Some(expansion) = &analysis.expansion {
                if expansion.to_uppercase() != token.to_uppercase() {
                    expanded_acronyms.push(ExpandedAcronym {
                        original: token.clone(),
                        expanded: expansion.clone(),
                        confidence: analysis.confidence,
                    });
                }
            }
        }
        if DIGITS.is_match(token) || is_function_marker_token(analysis) {
            continue;
        }
        let segment = analysis
            .expansion
            .clone()
            .unwrap_or_else(|| analysis.normalized_token.clone());
        name_segments.push(segment);
    }

    let joined = name_segments.join(" ");
    let normalized_name = {
        let titled = title_case_words(&joined);
        if titled.trim().is_empty() {
            title_case_words(primary)
        } else {
            titled
        }
    };

    let synthesized = normalized_name.clone();
    let base_description = if cfg.prefer_contractor_description {
        point
            .description
            .as_deref()
            .filter(|d| d.len() > synthesized.len())
            .map(|d| d.to_string())
            .unwrap_or(synthesized)
    } else {
        synthesized
    };

    let expanded_description = match point_function {
        PointFunction::Setpoint => format!("{base_description} Setpoint"),
        PointFunction::Command => format!("{base_description} Command"),
        PointFunction::Status => format!("{base_description} Status"),
        PointFunction::Sensor => {
            let is_input = point
                .object_type
                .map(|t| t.is_input())
                .unwrap_or(false);
            if is_input {
                format!("{base_description} Sensor")
            } else {
                base_description
            }
        }
        PointFunction::Unknown => base_description,
    };

    let mut tags = Vec::new();
    push_tag(&mut tags, "point", TagCategory::Entity, 1.0, TagSource::Explicit);
    for analysis in &analyses {
        // suggested_tags live on the dictionary entry, not the analysis; we
        // recover them by re-deriving from the expansion/category text
        // recorded during the cascade lookup.
        if let Some(acronym) = &analysis.matched_acronym {
            if let Some(entry) = dict
                .lookup_general(acronym)
                .or_else(|| {
                    ctx.equipment_type
                        .as_deref()
                        .and_then(|e| dict.lookup_equipment(e, acronym))
                })
                .or_else(|| {
                    ctx.vendor_name
                        .as_deref()
                        .and_then(|v| dict.lookup_vendor(v, acronym))
                })
            {
                for tag_name in &entry.suggested_tags {
                    push_tag(
                        &mut tags,
                        tag_name,
                        tag_category_for(tag_name),
                        analysis.confidence,
                        TagSource::Explicit,
                    );
                }
            }
        }
        if analysis.source == TokenSource::Unit {
            if let Some(expansion) = &analysis.expansion {
                if let Some(tag_name) = unit_category_tag(expansion) {
                    push_tag(
                        &mut tags,
                        tag_name,
                        tag_category_for(tag_name),
                        analysis.confidence,
                        TagSource::Inferred,
                    );
                }
            }
        }
    }
    let function_tag = match point_function {
        PointFunction::Sensor => Some("sensor"),
        PointFunction::Setpoint => Some("sp"),
        PointFunction::Command => Some("cmd"),
        PointFunction::Status => Some("status"),
        PointFunction::Unknown => None,
    };
    if let Some(name) = function_tag {
        push_tag(&mut tags, name, TagCategory::Function, 0.90, TagSource::Inferred);
    }

    let mean_token_confidence =
        analyses.iter().map(|a| a.confidence).sum::<f64>() / analyses.len() as f64;
    let has_context_inference = ctx.equipment_type.is_some()
        || ctx.vendor_name.is_some()
        || has_unit_normalization
        || inferred_vendor.is_some();

    let mut score = mean_token_confidence;
    if ctx.equipment_type.is_some() {
        score += cfg.context_equipment_bonus;
    }
    if has_unit_normalization || units_hint.is_some() {
        score += cfg.context_unit_bonus;
    }
    if inferred_vendor.is_some() {
        score += cfg.context_vendor_bonus;
    }
    let confidence_score = score.clamp(0.0, 1.0);
    let confidence_level = ConfidenceLevel::from_score(confidence_score);

    let method = analyses
        .iter()
        .map(|a| match a.source {
            TokenSource::Equipment => NormalizationMethod::Equipment,
            TokenSource::Vendor => NormalizationMethod::Vendor,
            TokenSource::General => NormalizationMethod::General,
            TokenSource::Unit => NormalizationMethod::Unit,
            TokenSource::Pattern => NormalizationMethod::Pattern,
        })
        .max_by(|a, b| method_rank(*a).cmp(&method_rank(*b)))
        .unwrap_or(NormalizationMethod::None);

    let applied_rules = vec![
        "tokenize".to_string(),
        "dictionary-cascade".to_string(),
        "function-determination".to_string(),
        "base-name-synthesis".to_string(),
        "tag-generation".to_string(),
        "confidence-scoring".to_string(),
    ];

    NormalizedPoint {
        normalized_name,
        expanded_description,
        point_function,
        units: units_hint.map(|u| u.to_string()),
        tags,
        confidence_level,
        confidence_score,
        method,
        applied_rules,
        expanded_acronyms,
        has_acronym_expansion,
        has_unit_normalization,
        has_context_inference,
        requires_manual_review: confidence_score < cfg.manual_review_threshold,
        errors: vec![],
    }
}

/// Orders normalization methods by cascade priority so the reported `method`
/// reflects the strongest source actually consulted across all tokens.
fn method_rank(m: NormalizationMethod) -> u8 {
    match m {
        NormalizationMethod::Equipment => 5,
        NormalizationMethod::Vendor => 4,
        NormalizationMethod::General => 3,
        NormalizationMethod::Unit => 2,
        NormalizationMethod::Pattern => 1,
        NormalizationMethod::None => 0,
    }
}

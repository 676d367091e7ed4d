//! Greedy, deterministic equipment-to-equipment auto-mapping (§4.5).
//!
//! Reads no wall clock (§5 — elapsed-time stats are the caller's to stamp,
//! via the `Clock` collaborator in `ops.rs`).

use rayon::prelude::*;

use crate::algo::string_distance::levenshtein_distance;
use crate::config::AutoMapperConfig;
use crate::model::{AutoMappingMatch, AutoMappingResult, AutoMappingStats, EquipmentRef, MatchType};

fn full_normalize(s: &str) -> String {
    s.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect()
}

fn soft_normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Generic equipment-descriptor words that catalog names often append
/// (`"VAV-1 Terminal"`) but BACnet-side discovered names usually omit.
/// Stripped before the soft-normalized comparison tiers so a name and its
/// catalog counterpart aren't penalized purely for carrying one of these.
const DESCRIPTOR_WORDS: &[&str] = &["terminal", "unit", "box", "controller", "equipment", "plant"];

fn soft_normalize_core(s: &str) -> String {
    soft_normalize(s)
        .split_whitespace()
        .filter(|w| !DESCRIPTOR_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The three-tier advanced name similarity (§4.5). Returns the first tier
/// that yields a result.
fn advanced_name_similarity(a: &str, b: &str) -> f64 {
    if full_normalize(a) == full_normalize(b) {
        return 1.00;
    }

    let sa = soft_normalize_core(a);
    let sb = soft_normalize_core(b);
    if sa == sb {
        return 0.95;
    }
    if !sa.is_empty() && !sb.is_empty() && (sa.contains(&sb) || sb.contains(&sa)) {
        let (shorter, longer) = if sa.len() <= sb.len() {
            (sa.len(), sb.len())
        } else {
            (sb.len(), sa.len())
        };
        return 0.80 * (shorter as f64 / longer as f64);
    }

    let max_len = sa.chars().count().max(sb.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(&sa, &sb) as f64 / max_len as f64)
}

fn normalize_type(s: &str) -> String {
    s.to_lowercase().trim().replace('_', " ")
}

/// A closed table of equivalent equipment-type spellings (§4.5).
fn type_groups() -> &'static [&'static [&'static str]] {
    &[
        &["vav controller", "vav", "vav terminal", "vav box"],
        &["ahu", "air handler unit", "air handling unit"],
        &["rtu", "rooftop unit", "roof top unit"],
        &["fcu", "fan coil unit", "fan coil"],
        &["chiller", "chilled water plant"],
        &["boiler", "hot water plant"],
    ]
}

fn type_compatibility(a: &str, b: &str) -> f64 {
    let na = normalize_type(a);
    let nb = normalize_type(b);
    if na == nb {
        return 1.00;
    }
    for group in type_groups() {
        if group.contains(&na.as_str()) && group.contains(&nb.as_str()) {
            return 0.90;
        }
    }
    if !na.is_empty() && !nb.is_empty() && (na.contains(&nb) || nb.contains(&na)) {
        return 0.60;
    }
    0.0
}

fn location_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(&a.to_lowercase(), &b.to_lowercase()) as f64 / max_len as f64)
}

struct ScoredTarget {
    index: usize,
    score: f64,
    type_compat: f64,
    name_sim: f64,
}

fn score_pair(source: &EquipmentRef, target: &EquipmentRef, cfg: &AutoMapperConfig) -> (f64, f64, f64) {
    let name_sim = advanced_name_similarity(&source.name, &target.name);

    let type_term = match (source.equipment_type.as_deref(), target.equipment_type.as_deref()) {
        (Some(a), Some(b)) => type_compatibility(a, b),
        _ => 0.0,
    };
    let loc_term = match (source.location.as_deref(), target.location.as_deref()) {
        (Some(a), Some(b)) => location_similarity(a, b),
        _ => 0.0,
    };

    // A full-normalization exact name match (tier 1 of advanced name
    // similarity) is definitionally the same piece of equipment; it
    // saturates the composite score to 1.00 regardless of how much type or
    // location data happens to be present.
    let score = if name_sim >= 0.999_999 {
        1.0
    } else {
        (cfg.name_weight * name_sim + cfg.type_weight * type_term + cfg.location_weight * loc_term)
            .min(1.0)
    };
    (score, type_term, name_sim)
}

/// `autoMap(sources, targets) → AutoMappingResult` (§4.5). Greedy and
/// deterministic given input order; target order only breaks ties.
pub fn auto_map(sources: &[EquipmentRef], targets: &[EquipmentRef], cfg: &AutoMapperConfig) -> AutoMappingResult {
    let mut claimed = vec![false; targets.len()];
    let mut exact = Vec::new();
    let mut suggested = Vec::new();
    let mut unmatched_source = Vec::new();

    for source in sources {
        // Scoring each remaining target is embarrassingly parallel and pure;
        // the subsequent sort (stable on score, then target name) is what
        // keeps the greedy assignment deterministic, not iteration order
        // here.
        let mut candidates: Vec<ScoredTarget> = targets
            .par_iter()
            .enumerate()
            .filter(|(i, _)| !claimed[*i])
            .map(|(i, target)| {
                let (score, type_compat, name_sim) = score_pair(source, target, cfg);
                ScoredTarget {
                    index: i,
                    score,
                    type_compat,
                    name_sim,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then(targets[a.index].name.cmp(&targets[b.index].name))
        });

        let best = candidates.into_iter().next();
        match best {
            Some(b) if b.score >= cfg.exact_threshold => {
                claimed[b.index] = true;
                exact.push(build_match(source, &targets[b.index], b.score, b.type_compat, b.name_sim));
            }
            Some(b) if b.score >= cfg.suggested_threshold => {
                claimed[b.index] = true;
                suggested.push(build_match(source, &targets[b.index], b.score, b.type_compat, b.name_sim));
            }
            _ => {
                unmatched_source.push(source.clone());
            }
        }
    }

    let unmatched_target: Vec<EquipmentRef> = targets
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed[*i])
        .map(|(_, t)| t.clone())
        .collect();

    let stats = AutoMappingStats {
        total_sources: sources.len(),
        total_targets: targets.len(),
        exact_count: exact.len(),
        suggested_count: suggested.len(),
        unmatched_count: unmatched_source.len(),
        elapsed_ms: 0,
    };

    AutoMappingResult {
        exact,
        suggested,
        unmatched_source,
        unmatched_target,
        stats,
    }
}

fn build_match(
    source: &EquipmentRef,
    target: &EquipmentRef,
    score: f64,
    type_compat: f64,
    name_sim: f64,
) -> AutoMappingMatch {
    let match_type = if type_compat > 0.0 {
        MatchType::TypeAssisted
    } else if name_sim >= 0.999 {
        MatchType::Exact
    } else {
        MatchType::Fuzzy
    };

    let mut reasons = vec![format!("name similarity {:.2}", name_sim)];
    if type_compat > 0.0 {
        reasons.push(format!("equipment type compatibility {:.2}", type_compat));
    }

    AutoMappingMatch {
        bacnet_equipment_id: source.id.clone(),
        cxalloy_equipment_id: target.id.clone(),
        confidence: score,
        match_type,
        reasons,
    }
}

//! Composite scoring between observed points and template points (§4.4).

use rayon::prelude::*;

use crate::algo::signature;
use crate::algo::string_distance::levenshtein_distance;
use crate::config::EngineConfig;
use crate::model::{
    ConfidenceLevel, EquipmentTemplate, KeywordMatch, MatchQuality, NormalizationMethod,
    NormalizedPoint, ObservedPoint, PointTemplate, TagCategory, TagSource, TemplateMatch,
};

fn template_point_signature(
    pt: &PointTemplate,
    cfg: &EngineConfig,
) -> crate::model::PointSignature {
    let shim = NormalizedPoint {
        normalized_name: pt.name.clone(),
        expanded_description: pt.description.clone().unwrap_or_default(),
        point_function: pt.point_function,
        units: pt.units.clone(),
        tags: vec![crate::model::Tag {
            name: "point".to_string(),
            category: TagCategory::Entity,
            confidence: 1.0,
            source: TagSource::Explicit,
        }],
        confidence_level: ConfidenceLevel::High,
        confidence_score: pt.default_confidence,
        method: NormalizationMethod::None,
        applied_rules: vec![],
        expanded_acronyms: vec![],
        has_acronym_expansion: false,
        has_unit_normalization: pt.units.is_some(),
        has_context_inference: false,
        requires_manual_review: false,
        errors: vec![],
    };
    signature::signature(&shim, pt.object_type, &cfg.signature)
}

fn pattern_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(a, b) as f64 / max_len as f64)
}

fn keyword_jaccard(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sa: std::collections::HashSet<String> = a.iter().map(|k| k.to_lowercase()).collect();
    let sb: std::collections::HashSet<String> = b.iter().map(|k| k.to_lowercase()).collect();
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

fn context_match(op: &ObservedPoint, pt: &PointTemplate) -> f64 {
    let mut matched = 0.0;
    let mut present = 0;
    if let (Some(ou), Some(tu)) = (op.normalized.units.as_deref(), pt.units.as_deref()) {
        present += 1;
        if ou.eq_ignore_ascii_case(tu) {
            matched += 1.0;
        }
    }
    if let (Some(oo), Some(to)) = (op.signature.object_type, pt.object_type) {
        present += 1;
        if oo == to {
            matched += 1.0;
        }
    }
    if present == 0 {
        0.0
    } else {
        matched / present as f64
    }
}

struct Candidate<'a> {
    score: f64,
    function_match: bool,
    units_match: bool,
    point: &'a ObservedPoint,
    pattern_matches: Vec<KeywordMatch>,
    quality: MatchQuality,
}

fn score_pair<'a>(
    op: &'a ObservedPoint,
    pt: &PointTemplate,
    template_sig: &crate::model::PointSignature,
    cfg: &EngineConfig,
) -> Candidate<'a> {
    let pattern = pattern_similarity(&op.signature.normalized_pattern, &template_sig.normalized_pattern);
    let jaccard = keyword_jaccard(&op.signature.keywords, &template_sig.keywords);
    let function_match = op.normalized.point_function == pt.point_function;
    let context = context_match(op, pt);

    let mc = &cfg.matcher;
    let mut score = mc.pattern_weight * pattern
        + mc.keyword_weight * jaccard
        + mc.function_weight * if function_match { 1.0 } else { 0.0 }
        + mc.context_weight * context;

    if op.signature.confidence > mc.high_confidence_boost_threshold {
        score *= mc.high_confidence_boost_factor;
    }
    let score = score.min(1.0);

    let units_match = matches!(
        (op.normalized.units.as_deref(), pt.units.as_deref()),
        (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
    );

    let observed_keywords: std::collections::HashSet<String> =
        op.signature.keywords.iter().map(|k| k.to_lowercase()).collect();
    let pattern_matches: Vec<KeywordMatch> = template_sig
        .keywords
        .iter()
        .enumerate()
        .map(|(i, k)| KeywordMatch {
            keyword: k.clone(),
            position: i,
            weight: 1.0 / template_sig.keywords.len().max(1) as f64,
            matched: observed_keywords.contains(&k.to_lowercase()),
        })
        .collect();

    let quality = MatchQuality {
        exact: score > 0.95,
        partial: score > 0.70 && score <= 0.95,
        fuzzy: score > 0.50 && score <= 0.70,
        context: function_match || context > 0.0,
    };

    Candidate {
        score,
        function_match,
        units_match,
        point: op,
        pattern_matches,
        quality,
    }
}

/// `match(points, template, opts) → ordered sequence of TemplateMatch` (§4.4).
pub fn match_template(
    points: &[ObservedPoint],
    template: &EquipmentTemplate,
    cfg: &EngineConfig,
) -> Vec<TemplateMatch> {
    let mut matches = Vec::new();

    for pt in &template.points {
        let template_sig = template_point_signature(pt, cfg);
        // Scoring every observed point against this template point is pure
        // and independent; the ranking below (score, then function/units
        // agreement, then object name) is what makes the winner
        // deterministic, not the order candidates are produced in.
        let mut candidates: Vec<Candidate> = points
            .par_iter()
            .map(|op| score_pair(op, pt, &template_sig, cfg))
            .filter(|c| c.score >= cfg.matcher.confidence_threshold)
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap()
                .then(b.function_match.cmp(&a.function_match))
                .then(b.units_match.cmp(&a.units_match))
                .then(a.point.object_name.cmp(&b.point.object_name))
        });

        if let Some(best) = candidates.into_iter().next() {
            let mut warnings = Vec::new();
            let mut recommendations = Vec::new();
            if pt.required && best.score < 0.80 {
                warnings.push(format!(
                    "required template point '{}' matched below 0.80 confidence",
                    pt.name
                ));
            }
            if !best.function_match {
                recommendations.push("observed point function disagrees with template".to_string());
            }
            if !best.units_match && pt.units.is_some() && best.point.normalized.units.is_some() {
                recommendations.push("observed point units disagree with template".to_string());
            }
            if best.point.signature.keywords.len() < 2 {
                recommendations.push("observed signature has fewer than two keywords".to_string());
            }

            matches.push(TemplateMatch {
                template_id: template.id.clone(),
                template_point_id: pt.template_point_id.clone(),
                matched_point_object_name: best.point.object_name.clone(),
                confidence: best.point.signature.confidence,
                match_score: best.score,
                pattern_matches: best.pattern_matches,
                quality: best.quality,
                warnings,
                recommendations,
            });
        }
    }

    matches.sort_by(|a, b| b.match_score.partial_cmp(&a.match_score).unwrap());
    matches.truncate(cfg.matcher.max_results);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{normalizer, signature as sig_mod};
    use crate::algo::dictionaries::builtin_dictionaries;
    use crate::model::{MatchingFacet, NormalizationContext, ObjectType, PointFunction, RawPoint};

    fn observed_s3() -> ObservedPoint {
        let dict = builtin_dictionaries();
        let ncfg = crate::config::NormalizerConfig::default();
        let p = RawPoint {
            object_name: "AV12".to_string(),
            object_type: Some(ObjectType::AV),
            display_name: "ZN-T SP".to_string(),
            description: None,
            units: Some("°F".to_string()),
            is_writable: true,
            is_command: false,
        };
        let normalized = normalizer::normalize(&p, &NormalizationContext::default(), &dict, &ncfg);
        let scfg = crate::config::SignatureConfig::default();
        let signature = sig_mod::signature(&normalized, Some(ObjectType::AV), &scfg);
        ObservedPoint {
            object_name: p.object_name,
            normalized,
            signature,
            bacnet_cur: None,
            bacnet_dis: Some("ZN-T".to_string()),
            bacnet_desc: None,
        }
    }

    #[test]
    fn s5_template_match_with_context_agreement() {
        let engine_cfg = EngineConfig::default();
        let template = EquipmentTemplate {
            id: "tmpl-1".to_string(),
            name: "VAV Terminal".to_string(),
            description: None,
            equipment_type: "VAV_CONTROLLER".to_string(),
            category: None,
            vendor: None,
            model: None,
            points: vec![PointTemplate {
                template_point_id: "tp-1".to_string(),
                name: "Zone Temp Setpoint".to_string(),
                description: None,
                point_function: PointFunction::Setpoint,
                object_type: Some(ObjectType::AV),
                units: Some("°F".to_string()),
                required: true,
                nav_name: None,
                bacnet_cur: None,
                bacnet_dis: Some("ZN-T".to_string()),
                bacnet_desc: None,
                matching_facet: MatchingFacet::BacnetDis,
                default_confidence: 0.80,
                tags: vec![],
            }],
            template_type: crate::model::TemplateType::Equipment,
            is_built_in: true,
            is_default: true,
            usage_count: 0,
            success_rate: 0.0,
            effectiveness: 0.0,
            created_at: 0,
            updated_at: 0,
        };
        let observed = vec![observed_s3()];
        let results = match_template(&observed, &template, &engine_cfg);
        assert_eq!(results.len(), 1);
        assert!(results[0].match_score >= 0.70);
        assert!(results[0].quality.context);
    }

    #[test]
    fn no_match_below_threshold_is_dropped() {
        let engine_cfg = EngineConfig::default();
        let template = EquipmentTemplate {
            id: "tmpl-1".to_string(),
            name: "AHU".to_string(),
            description: None,
            equipment_type: "AHU".to_string(),
            category: None,
            vendor: None,
            model: None,
            points: vec![PointTemplate {
                template_point_id: "tp-1".to_string(),
                name: "Supply Fan Run Status".to_string(),
                description: None,
                point_function: PointFunction::Status,
                object_type: Some(ObjectType::BI),
                units: None,
                required: false,
                nav_name: None,
                bacnet_cur: None,
                bacnet_dis: None,
                bacnet_desc: None,
                matching_facet: MatchingFacet::BacnetDis,
                default_confidence: 0.80,
                tags: vec![],
            }],
            template_type: crate::model::TemplateType::Equipment,
            is_built_in: true,
            is_default: true,
            usage_count: 0,
            success_rate: 0.0,
            effectiveness: 0.0,
            created_at: 0,
            updated_at: 0,
        };
        let observed = vec![observed_s3()];
        let results = match_template(&observed, &template, &engine_cfg);
        assert!(results.is_empty());
    }

    #[test]
    fn max_results_is_respected() {
        let mut cfg = EngineConfig::default();
        cfg.matcher.max_results = 1;
        let template = EquipmentTemplate {
            id: "tmpl-1".to_string(),
            name: "VAV".to_string(),
            description: None,
            equipment_type: "VAV_CONTROLLER".to_string(),
            category: None,
            vendor: None,
            model: None,
            points: vec![
                PointTemplate {
                    template_point_id: "tp-1".to_string(),
                    name: "Zone Temp Setpoint".to_string(),
                    description: None,
                    point_function: PointFunction::Setpoint,
                    object_type: Some(ObjectType::AV),
                    units: Some("°F".to_string()),
                    required: true,
                    nav_name: None,
                    bacnet_cur: None,
                    bacnet_dis: Some("ZN-T".to_string()),
                    bacnet_desc: None,
                    matching_facet: MatchingFacet::BacnetDis,
                    default_confidence: 0.80,
                    tags: vec![],
                },
                PointTemplate {
                    template_point_id: "tp-2".to_string(),
                    name: "Zone Temp Setpoint Two".to_string(),
                    description: None,
                    point_function: PointFunction::Setpoint,
                    object_type: Some(ObjectType::AV),
                    units: Some("°F".to_string()),
                    required: false,
                    nav_name: None,
                    bacnet_cur: None,
                    bacnet_dis: Some("ZN-T".to_string()),
                    bacnet_desc: None,
                    matching_facet: MatchingFacet::BacnetDis,
                    default_confidence: 0.80,
                    tags: vec![],
                },
            ],
            template_type: crate::model::TemplateType::Equipment,
            is_built_in: true,
            is_default: true,
            usage_count: 0,
            success_rate: 0.0,
            effectiveness: 0.0,
            created_at: 0,
            updated_at: 0,
        };
        let observed = vec![observed_s3()];
        let results = match_template(&observed, &template, &cfg);
        assert!(results.len() <= 1);
    }
}

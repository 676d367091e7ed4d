//! Binds observed points to a saved template's point slots (§4.6). Reads no
//! wall clock — `appliedAt` is supplied by the caller via the `Clock`
//! collaborator (§6), and `id` is likewise the caller's to generate.

use crate::model::{
    AppliedPoint, EquipmentTemplate, MatchingOptions, MatchingResults, ObservedPoint,
    TemplateApplication,
};

fn facet_values_agree(template_value: &str, observed_value: &str, allow_partial: bool) -> bool {
    let t = template_value.to_lowercase();
    let o = observed_value.to_lowercase();
    if t == o {
        return true;
    }
    allow_partial && (t.contains(&o) || o.contains(&t))
}

/// `apply(template, targetEquipment, targetPoints, opts, appliedBy) →
/// TemplateApplication` (§4.6).
#[allow(clippy::too_many_arguments)]
pub fn apply(
    id: &str,
    template: &EquipmentTemplate,
    target_equipment_id: &str,
    target_points: &[ObservedPoint],
    opts: &MatchingOptions,
    applied_by: &str,
    applied_at: i64,
) -> TemplateApplication {
    let mut claimed = vec![false; target_points.len()];
    let mut applied_points = Vec::with_capacity(template.points.len());

    for pt in &template.points {
        let template_value = pt.facet_value();
        let mut chosen: Option<usize> = None;

        if let Some(tv) = template_value {
            for (i, op) in target_points.iter().enumerate() {
                if claimed[i] {
                    continue;
                }
                if let Some(ov) = op.facet_value(pt.matching_facet) {
                    if facet_values_agree(tv, ov, false) {
                        chosen = Some(i);
                        break;
                    }
                }
            }
            if chosen.is_none() && opts.allow_partial_matches {
                for (i, op) in target_points.iter().enumerate() {
                    if claimed[i] {
                        continue;
                    }
                    if let Some(ov) = op.facet_value(pt.matching_facet) {
                        if facet_values_agree(tv, ov, true) {
                            chosen = Some(i);
                            break;
                        }
                    }
                }
            }
        }

        match chosen {
            Some(i) => {
                claimed[i] = true;
                let op = &target_points[i];
                let nav_name = if opts.copy_nav_name {
                    pt.nav_name.clone()
                } else {
                    Some(op.object_name.clone())
                };
                let units = if opts.copy_units {
                    pt.units.clone()
                } else {
                    op.normalized.units.clone()
                };
                let confidence = if op.signature.confidence > 0.0 {
                    op.signature.confidence
                } else {
                    0.70
                };
                applied_points.push(AppliedPoint {
                    point_object_name: Some(op.object_name.clone()),
                    template_point_id: pt.template_point_id.clone(),
                    matched: true,
                    confidence,
                    nav_name,
                    units,
                });
            }
            None => {
                applied_points.push(AppliedPoint {
                    point_object_name: None,
                    template_point_id: pt.template_point_id.clone(),
                    matched: false,
                    confidence: 0.0,
                    nav_name: None,
                    units: None,
                });
            }
        }
    }

    let matched_points = applied_points.iter().filter(|p| p.matched).count();
    let unmatched_points = target_points.len().saturating_sub(matched_points);
    let average_confidence = if matched_points == 0 {
        0.0
    } else {
        applied_points.iter().filter(|p| p.matched).map(|p| p.confidence).sum::<f64>()
            / matched_points as f64
    };
    let required_points_matched = template
        .points
        .iter()
        .zip(applied_points.iter())
        .filter(|(pt, ap)| pt.required && ap.matched)
        .count();
    let optional_points_matched = template
        .points
        .iter()
        .zip(applied_points.iter())
        .filter(|(pt, ap)| !pt.required && ap.matched)
        .count();

    let matching_results = MatchingResults {
        total_points: target_points.len(),
        matched_points,
        unmatched_points,
        average_confidence,
        required_points_matched,
        optional_points_matched,
    };

    let is_successful = matched_points > 0 && average_confidence >= opts.confidence_threshold;

    TemplateApplication {
        id: id.to_string(),
        template_id: template.id.clone(),
        target_equipment_id: target_equipment_id.to_string(),
        applied_points,
        matching_options: opts.clone(),
        matching_results,
        is_successful,
        applied_at,
        applied_by: applied_by.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        MatchingFacet, NormalizationMethod, ObjectType, PointFunction, PointSignature,
        PointTemplate, TemplateType,
    };

    fn normalized_point(units: Option<&str>) -> crate::model::NormalizedPoint {
        crate::model::NormalizedPoint {
            normalized_name: "Zone Temperature".to_string(),
            expanded_description: "Zone Temperature Sensor".to_string(),
            point_function: PointFunction::Sensor,
            units: units.map(|u| u.to_string()),
            tags: vec![],
            confidence_level: crate::model::ConfidenceLevel::High,
            confidence_score: 0.9,
            method: NormalizationMethod::General,
            applied_rules: vec![],
            expanded_acronyms: vec![],
            has_acronym_expansion: true,
            has_unit_normalization: true,
            has_context_inference: false,
            requires_manual_review: false,
            errors: vec![],
        }
    }

    fn observed(object_name: &str, bacnet_dis: &str, units: Option<&str>) -> ObservedPoint {
        ObservedPoint {
            object_name: object_name.to_string(),
            normalized: normalized_point(units),
            signature: PointSignature {
                pattern: "*ZONE*TEMPERATURE*".to_string(),
                normalized_pattern: "ZONETEMPERATURE".to_string(),
                keywords: vec!["zone".to_string(), "temperature".to_string()],
                confidence: 0.85,
                specificity: 0.70,
                point_function: PointFunction::Sensor,
                object_type: Some(ObjectType::AI),
                units: units.map(|u| u.to_string()),
                match_count: 0,
                successful_matches: 0,
            },
            bacnet_cur: None,
            bacnet_dis: Some(bacnet_dis.to_string()),
            bacnet_desc: None,
        }
    }

    fn template() -> EquipmentTemplate {
        EquipmentTemplate {
            id: "tmpl-1".to_string(),
            name: "VAV Terminal".to_string(),
            description: None,
            equipment_type: "VAV_CONTROLLER".to_string(),
            category: None,
            vendor: None,
            model: None,
            points: vec![
                PointTemplate {
                    template_point_id: "tp-1".to_string(),
                    name: "Zone Temp".to_string(),
                    description: None,
                    point_function: PointFunction::Sensor,
                    object_type: Some(ObjectType::AI),
                    units: Some("°F".to_string()),
                    required: true,
                    nav_name: Some("ZN-T".to_string()),
                    bacnet_cur: None,
                    bacnet_dis: Some("ZN-T".to_string()),
                    bacnet_desc: None,
                    matching_facet: MatchingFacet::BacnetDis,
                    default_confidence: 0.80,
                    tags: vec![],
                },
                PointTemplate {
                    template_point_id: "tp-2".to_string(),
                    name: "Discharge Temp".to_string(),
                    description: None,
                    point_function: PointFunction::Sensor,
                    object_type: Some(ObjectType::AI),
                    units: Some("°F".to_string()),
                    required: false,
                    nav_name: None,
                    bacnet_cur: None,
                    bacnet_dis: Some("DA-T".to_string()),
                    bacnet_desc: None,
                    matching_facet: MatchingFacet::BacnetDis,
                    default_confidence: 0.80,
                    tags: vec![],
                },
            ],
            template_type: TemplateType::Equipment,
            is_built_in: true,
            is_default: true,
            usage_count: 0,
            success_rate: 0.0,
            effectiveness: 0.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn exact_facet_match_binds_point() {
        let t = template();
        let opts = MatchingOptions::default();
        let points = vec![observed("AI1", "ZN-T", Some("°F"))];
        let app = apply("app-1", &t, "eq-1", &points, &opts, "tester", 0);
        assert_eq!(app.matching_results.matched_points, 1);
        assert!(app.applied_points[0].matched);
        assert!(!app.applied_points[1].matched);
    }

    #[test]
    fn required_unmatched_point_still_emitted() {
        let t = template();
        let opts = MatchingOptions::default();
        let points: Vec<ObservedPoint> = vec![];
        let app = apply("app-1", &t, "eq-1", &points, &opts, "tester", 0);
        assert_eq!(app.applied_points.len(), 2);
        assert!(app.applied_points.iter().all(|p| !p.matched));
    }

    #[test]
    fn partial_match_used_only_when_allowed() {
        let t = template();
        let mut opts = MatchingOptions::default();
        opts.allow_partial_matches = false;
        let points = vec![observed("AI1", "ZN-T-2", Some("°F"))];
        let app = apply("app-1", &t, "eq-1", &points, &opts, "tester", 0);
        assert!(!app.applied_points[0].matched);

        opts.allow_partial_matches = true;
        let app2 = apply("app-1", &t, "eq-1", &points, &opts, "tester", 0);
        assert!(app2.applied_points[0].matched);
    }

    #[test]
    fn idempotence_same_inputs_same_applied_points() {
        let t = template();
        let opts = MatchingOptions::default();
        let points = vec![observed("AI1", "ZN-T", Some("°F"))];
        let a = apply("app-1", &t, "eq-1", &points, &opts, "tester", 100);
        let b = apply("app-1", &t, "eq-1", &points, &opts, "tester", 999);
        assert_eq!(
            a.applied_points.len(),
            b.applied_points.len()
        );
        for (x, y) in a.applied_points.iter().zip(b.applied_points.iter()) {
            assert_eq!(x.point_object_name, y.point_object_name);
            assert_eq!(x.matched, y.matched);
            assert_eq!(x.template_point_id, y.template_point_id);
        }
    }
}

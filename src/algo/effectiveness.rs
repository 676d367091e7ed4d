//! Aggregates a template's applications into an effectiveness report (§4.7).

use crate::model::{EffectivenessReport, EquipmentTemplate, TemplateApplication};

fn match_rate(app: &TemplateApplication) -> f64 {
    if app.matching_results.total_points == 0 {
        0.0
    } else {
        app.matching_results.matched_points as f64 / app.matching_results.total_points as f64
    }
}

/// `effectiveness(template, applications) → EffectivenessReport` (§4.7).
pub fn effectiveness(_template: &EquipmentTemplate, applications: &[TemplateApplication]) -> EffectivenessReport {
    let usage_frequency = applications.len() as u64;

    if applications.is_empty() {
        return EffectivenessReport {
            overall_effectiveness: 0.0,
            point_match_rate: 0.0,
            confidence_score: 0.0,
            usage_frequency,
            recommendations: vec!["No applications recorded yet.".to_string()],
        };
    }

    let successful = applications.iter().filter(|a| a.is_successful).count();
    let mean_match_rate =
        applications.iter().map(match_rate).sum::<f64>() / applications.len() as f64;
    let mean_confidence = applications
        .iter()
        .map(|a| a.matching_results.average_confidence)
        .sum::<f64>()
        / applications.len() as f64;

    let success_rate = successful as f64 / applications.len() as f64;
    let overall_effectiveness = (success_rate * mean_match_rate * mean_confidence).clamp(0.0, 1.0);

    let mut recommendations = Vec::new();
    if overall_effectiveness < 0.60 {
        recommendations.push(
            "Overall effectiveness is below 0.60; review the template's point definitions against recent applications.".to_string(),
        );
    }
    if mean_match_rate < 0.70 {
        recommendations.push(
            "Point match rate is below 0.70; many applications are leaving template points unbound.".to_string(),
        );
    }
    if mean_confidence < 0.80 {
        recommendations.push(
            "Average match confidence is below 0.80; consider tightening the template's matching facets.".to_string(),
        );
    }

    EffectivenessReport {
        overall_effectiveness,
        point_match_rate: mean_match_rate,
        confidence_score: mean_confidence,
        usage_frequency,
        recommendations,
    }
}

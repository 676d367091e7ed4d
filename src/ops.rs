//! Shared operation wrappers for all interfaces (CLI, MCP, persistence).
//!
//! Each `op_*` function is a thin, synchronous wrapper around one or more
//! `algo` modules. The algo layer never reads the wall clock (§5); the one
//! exception — `autoMap`'s `elapsed_ms` stat and `apply`'s `appliedAt`
//! timestamp — is supplied here through the `Clock` trait, so the pure
//! matching/mapping algorithms stay trivially unit-testable and this is the
//! only place that needs a fake clock swapped in for a real one.

use crate::algo::effectiveness as eff;
use crate::algo::dictionaries::DictionarySet;
use crate::algo::{applicator, automap, matcher, normalizer, signature as sig};
use crate::config::EngineConfig;
use crate::model::{
    AutoMappingResult, EffectivenessReport, EquipmentRef, EquipmentTemplate, MatchingOptions,
    NormalizationContext, NormalizedPoint, ObjectType, ObservedPoint, PointSignature, RawPoint,
    TemplateApplication, TemplateMatch,
};

/// Supplies wall-clock readings to the operation layer.
pub trait Clock {
    fn now_unix_ms(&self) -> i64;
}

/// Production clock backed by `SystemTime`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_ms(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// `normalize(point, context) → NormalizedPoint` (§4.2).
pub fn op_normalize(
    point: &RawPoint,
    ctx: &NormalizationContext,
    dict: &DictionarySet,
    cfg: &EngineConfig,
) -> NormalizedPoint {
    normalizer::normalize(point, ctx, dict, &cfg.normalizer)
}

/// `signature(normalizedPoint, objectType) → PointSignature` (§4.3).
pub fn op_signature(
    np: &NormalizedPoint,
    object_type: Option<ObjectType>,
    cfg: &EngineConfig,
) -> PointSignature {
    sig::signature(np, object_type, &cfg.signature)
}

/// `matchTemplate(observedPoints, template) → TemplateMatch[]` (§4.4).
pub fn op_match_template(
    points: &[ObservedPoint],
    template: &EquipmentTemplate,
    cfg: &EngineConfig,
) -> Vec<TemplateMatch> {
    matcher::match_template(points, template, cfg)
}

/// `autoMap(sources, targets) → AutoMappingResult` (§4.5).
pub fn op_auto_map(
    sources: &[EquipmentRef],
    targets: &[EquipmentRef],
    cfg: &EngineConfig,
    clock: &dyn Clock,
) -> AutoMappingResult {
    let started = clock.now_unix_ms();
    let mut result = automap::auto_map(sources, targets, &cfg.auto_mapper);
    result.stats.elapsed_ms = (clock.now_unix_ms() - started).max(0) as u64;
    result
}

/// `apply(template, targetEquipment, targetPoints, opts, appliedBy) →
/// TemplateApplication` (§4.6).
#[allow(clippy::too_many_arguments)]
pub fn op_apply(
    id: &str,
    template: &EquipmentTemplate,
    target_equipment_id: &str,
    target_points: &[ObservedPoint],
    opts: &MatchingOptions,
    applied_by: &str,
    clock: &dyn Clock,
) -> TemplateApplication {
    applicator::apply(
        id,
        template,
        target_equipment_id,
        target_points,
        opts,
        applied_by,
        clock.now_unix_ms(),
    )
}

/// `effectiveness(template, applications) → EffectivenessReport` (§4.7).
pub fn op_effectiveness(
    template: &EquipmentTemplate,
    applications: &[TemplateApplication],
) -> EffectivenessReport {
    eff::effectiveness(template, applications)
}

//! Single configuration surface for the scoring constants, weights, and
//! priority bases the source scatters across the normalizer, signature
//! builder, matcher, and auto-mapper. Collected here so the test suite can
//! pin them (§9).

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub equipment_priority_base: f64,
    pub vendor_priority_base: f64,
    pub context_equipment_bonus: f64,
    pub context_unit_bonus: f64,
    pub context_vendor_bonus: f64,
    pub manual_review_threshold: f64,
    /// §9 open question (a): prefer the contractor-provided description over
    /// the synthesized one when it is longer. Defaults to off — the
    /// synthesized name stays canonical unless a caller opts in.
    pub prefer_contractor_description: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            equipment_priority_base: 0.95,
            vendor_priority_base: 0.85,
            context_equipment_bonus: 0.10,
            context_unit_bonus: 0.10,
            context_vendor_bonus: 0.05,
            manual_review_threshold: 0.70,
            prefer_contractor_description: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignatureConfig {
    pub max_wildcards: usize,
    pub min_keyword_length: usize,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            max_wildcards: 5,
            min_keyword_length: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub pattern_weight: f64,
    pub keyword_weight: f64,
    pub function_weight: f64,
    pub context_weight: f64,
    pub high_confidence_boost_threshold: f64,
    pub high_confidence_boost_factor: f64,
    pub confidence_threshold: f64,
    pub max_results: usize,
    pub required_point_warning_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            pattern_weight: 0.40,
            keyword_weight: 0.30,
            function_weight: 0.20,
            context_weight: 0.10,
            high_confidence_boost_threshold: 0.80,
            high_confidence_boost_factor: 1.10,
            confidence_threshold: 0.70,
            max_results: 10,
            required_point_warning_threshold: 0.80,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoMapperConfig {
    pub name_weight: f64,
    pub type_weight: f64,
    pub location_weight: f64,
    pub exact_threshold: f64,
    pub suggested_threshold: f64,
}

impl Default for AutoMapperConfig {
    fn default() -> Self {
        Self {
            name_weight: 0.80,
            type_weight: 0.10,
            location_weight: 0.10,
            exact_threshold: 0.95,
            suggested_threshold: 0.60,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub normalizer: NormalizerConfig,
    pub signature: SignatureConfig,
    pub matcher: MatcherConfig,
    pub auto_mapper: AutoMapperConfig,
}

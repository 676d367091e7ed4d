//! Data model shared across the normalization, signature, matching, and
//! auto-mapping engines. Mirrors the closed enumerations and record shapes
//! the source documents as the contract between ingest, matching, and
//! persistence layers.

use serde::{Deserialize, Serialize};

/// The closed set of BACnet object types a RawPoint may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    AI,
    AO,
    AV,
    BI,
    BO,
    BV,
    MSI,
    MSO,
    MSV,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AI => "AI",
            Self::AO => "AO",
            Self::AV => "AV",
            Self::BI => "BI",
            Self::BO => "BO",
            Self::BV => "BV",
            Self::MSI => "MSI",
            Self::MSO => "MSO",
            Self::MSV => "MSV",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AI" => Some(Self::AI),
            "AO" => Some(Self::AO),
            "AV" => Some(Self::AV),
            "BI" => Some(Self::BI),
            "BO" => Some(Self::BO),
            "BV" => Some(Self::BV),
            "MSI" => Some(Self::MSI),
            "MSO" => Some(Self::MSO),
            "MSV" => Some(Self::MSV),
            _ => None,
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::AO | Self::BO | Self::MSO)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::AI | Self::BI | Self::MSI)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::AV | Self::BV | Self::MSV)
    }

    pub fn is_binary_or_multistate_input(&self) -> bool {
        matches!(self, Self::BI | Self::MSI)
    }
}

/// A BACnet point as it arrives from an external trio/CSV ingest path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPoint {
    pub object_name: String,
    pub object_type: Option<ObjectType>,
    pub display_name: String,
    pub description: Option<String>,
    pub units: Option<String>,
    #[serde(default)]
    pub is_writable: bool,
    #[serde(default)]
    pub is_command: bool,
}

impl RawPoint {
    /// The primary source for normalization: `displayName` if non-empty, else `objectName`.
    pub fn primary_source(&self) -> &str {
        if !self.display_name.trim().is_empty() {
            &self.display_name
        } else {
            &self.object_name
        }
    }
}

/// Optional, immutable-for-the-call context supplied alongside a RawPoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationContext {
    pub equipment_type: Option<String>,
    pub vendor_name: Option<String>,
    pub units: Option<String>,
    pub point_category: Option<String>,
}

/// Which dictionary cascade step produced a token's expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenSource {
    General,
    Equipment,
    Vendor,
    Unit,
    Pattern,
}

/// Internal per-token analysis result produced by the dictionary cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub original_token: String,
    pub normalized_token: String,
    pub confidence: f64,
    pub source: TokenSource,
    pub matched_acronym: Option<String>,
    pub expansion: Option<String>,
}

/// The point function a normalized point is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointFunction {
    Sensor,
    Setpoint,
    Command,
    Status,
    Unknown,
}

impl PointFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sensor => "Sensor",
            Self::Setpoint => "Setpoint",
            Self::Command => "Command",
            Self::Status => "Status",
            Self::Unknown => "Unknown",
        }
    }
}

/// Confidence bucket derived from `confidenceScore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.80 {
            Self::High
        } else if score >= 0.50 {
            Self::Medium
        } else if score >= 0.20 {
            Self::Low
        } else {
            Self::Unknown
        }
    }
}

/// A semantic tag category drawn from the haystack-style tagging vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagCategory {
    Entity,
    Substance,
    Measurement,
    Function,
    Location,
    State,
    Other,
}

/// Whether a tag was stated directly by a dictionary entry or derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagSource {
    Explicit,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub category: TagCategory,
    pub confidence: f64,
    pub source: TagSource,
}

/// Which dictionary/inference method ultimately won for this point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMethod {
    General,
    Equipment,
    Vendor,
    Unit,
    Pattern,
    None,
}

/// An expanded acronym recorded on a NormalizedPoint for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandedAcronym {
    pub original: String,
    pub expanded: String,
    pub confidence: f64,
}

/// Output of the normalizer (§4.2). Total — always produced, never throws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub normalized_name: String,
    pub expanded_description: String,
    pub point_function: PointFunction,
    pub units: Option<String>,
    pub tags: Vec<Tag>,
    pub confidence_level: ConfidenceLevel,
    pub confidence_score: f64,
    pub method: NormalizationMethod,
    pub applied_rules: Vec<String>,
    pub expanded_acronyms: Vec<ExpandedAcronym>,
    pub has_acronym_expansion: bool,
    pub has_unit_normalization: bool,
    pub has_context_inference: bool,
    pub requires_manual_review: bool,
    pub errors: Vec<String>,
}

impl NormalizedPoint {
    /// True when the point's tag set carries the universal `point` seed tag.
    pub fn has_seed_tag(&self) -> bool {
        self.tags.iter().any(|t| t.name == "point")
    }
}

/// A wildcard keyword signature derived from a NormalizedPoint (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSignature {
    pub pattern: String,
    pub normalized_pattern: String,
    pub keywords: Vec<String>,
    pub confidence: f64,
    pub specificity: f64,
    pub point_function: PointFunction,
    pub object_type: Option<ObjectType>,
    pub units: Option<String>,
    pub match_count: u32,
    pub successful_matches: u32,
}

/// Which BACnet display facet a template point's matching value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingFacet {
    BacnetCur,
    BacnetDis,
    BacnetDesc,
}

/// A single point slot within an EquipmentTemplate (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTemplate {
    pub template_point_id: String,
    pub name: String,
    pub description: Option<String>,
    pub point_function: PointFunction,
    pub object_type: Option<ObjectType>,
    pub units: Option<String>,
    pub required: bool,
    pub nav_name: Option<String>,
    pub bacnet_cur: Option<String>,
    pub bacnet_dis: Option<String>,
    pub bacnet_desc: Option<String>,
    pub matching_facet: MatchingFacet,
    pub default_confidence: f64,
    pub tags: Vec<String>,
}

impl PointTemplate {
    /// The template's value for its declared matching facet, if any.
    pub fn facet_value(&self) -> Option<&str> {
        match self.matching_facet {
            MatchingFacet::BacnetCur => self.bacnet_cur.as_deref(),
            MatchingFacet::BacnetDis => self.bacnet_dis.as_deref(),
            MatchingFacet::BacnetDesc => self.bacnet_desc.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateType {
    Equipment,
    Mapping,
    Hybrid,
}

/// An ordered set of point templates plus equipment-type metadata (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub equipment_type: String,
    pub category: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub points: Vec<PointTemplate>,
    pub template_type: TemplateType,
    pub is_built_in: bool,
    pub is_default: bool,
    pub usage_count: u64,
    pub success_rate: f64,
    pub effectiveness: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl EquipmentTemplate {
    pub fn required_point_count(&self) -> usize {
        self.points.iter().filter(|p| p.required).count()
    }
}

/// Per-keyword detail of how a TemplateMatch's pattern overlap was computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub position: usize,
    pub weight: f64,
    pub matched: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchQuality {
    pub exact: bool,
    pub partial: bool,
    pub fuzzy: bool,
    pub context: bool,
}

/// The result of scoring one observed point against one template point (§4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMatch {
    pub template_id: String,
    pub template_point_id: String,
    pub matched_point_object_name: String,
    pub confidence: f64,
    pub match_score: f64,
    pub pattern_matches: Vec<KeywordMatch>,
    pub quality: MatchQuality,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    Fuzzy,
    TypeAssisted,
}

/// Minimal equipment record the auto-mapper pairs on (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRef {
    pub id: String,
    pub name: String,
    pub equipment_type: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoMappingMatch {
    pub bacnet_equipment_id: String,
    pub cxalloy_equipment_id: String,
    pub confidence: f64,
    pub match_type: MatchType,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoMappingStats {
    pub total_sources: usize,
    pub total_targets: usize,
    pub exact_count: usize,
    pub suggested_count: usize,
    pub unmatched_count: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoMappingResult {
    pub exact: Vec<AutoMappingMatch>,
    pub suggested: Vec<AutoMappingMatch>,
    pub unmatched_source: Vec<EquipmentRef>,
    pub unmatched_target: Vec<EquipmentRef>,
    pub stats: AutoMappingStats,
}

/// One template point's binding decision recorded by the applicator (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedPoint {
    pub point_object_name: Option<String>,
    pub template_point_id: String,
    pub matched: bool,
    pub confidence: f64,
    pub nav_name: Option<String>,
    pub units: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingResults {
    pub total_points: usize,
    pub matched_points: usize,
    pub unmatched_points: usize,
    pub average_confidence: f64,
    pub required_points_matched: usize,
    pub optional_points_matched: usize,
}

/// Options governing how the applicator binds observed points to a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingOptions {
    pub allow_partial_matches: bool,
    pub copy_nav_name: bool,
    pub copy_units: bool,
    pub confidence_threshold: f64,
}

impl Default for MatchingOptions {
    fn default() -> Self {
        Self {
            allow_partial_matches: true,
            copy_nav_name: true,
            copy_units: false,
            confidence_threshold: 0.70,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateApplication {
    pub id: String,
    pub template_id: String,
    pub target_equipment_id: String,
    pub applied_points: Vec<AppliedPoint>,
    pub matching_options: MatchingOptions,
    pub matching_results: MatchingResults,
    pub is_successful: bool,
    pub applied_at: i64,
    pub applied_by: String,
}

/// An observed point presented to the applicator: the already-normalized
/// point plus the BACnet facet values the matcher can compare against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedPoint {
    pub object_name: String,
    pub normalized: NormalizedPoint,
    pub signature: PointSignature,
    pub bacnet_cur: Option<String>,
    pub bacnet_dis: Option<String>,
    pub bacnet_desc: Option<String>,
}

impl ObservedPoint {
    pub fn facet_value(&self, facet: MatchingFacet) -> Option<&str> {
        match facet {
            MatchingFacet::BacnetCur => self.bacnet_cur.as_deref(),
            MatchingFacet::BacnetDis => self.bacnet_dis.as_deref(),
            MatchingFacet::BacnetDesc => self.bacnet_desc.as_deref(),
        }
    }
}

/// Output of the effectiveness aggregator (§4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectivenessReport {
    pub overall_effectiveness: f64,
    pub point_match_rate: f64,
    pub confidence_score: f64,
    pub usage_frequency: u64,
    pub recommendations: Vec<String>,
}

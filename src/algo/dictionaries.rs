//! Acronym dictionaries consulted by the normalizer's token cascade (§3, §4.2).
//!
//! Three tables — general, equipment-specific, vendor-specific — each a
//! sequence of `AcronymEntry` records. Entries are process-wide and
//! immutable once loaded (§5): nothing on the `normalize`/`signature`/
//! `match`/`autoMap` call path mutates a `DictionarySet`.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::PointFunction;

/// One acronym-table row: `{token, expansion, category, priority, suggested
/// tags, implied function}` (§3). Priority is 1–10, 10 strongest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcronymEntry {
    pub token: String,
    pub expansion: String,
    pub category: String,
    pub priority: u8,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub implied_function: Option<PointFunction>,
}

impl AcronymEntry {
    fn new(token: &str, expansion: &str, category: &str, priority: u8, tags: &[&str]) -> Self {
        Self {
            token: token.to_string(),
            expansion: expansion.to_string(),
            category: category.to_string(),
            priority,
            suggested_tags: tags.iter().map(|s| s.to_string()).collect(),
            implied_function: None,
        }
    }

    fn with_function(mut self, f: PointFunction) -> Self {
        self.implied_function = Some(f);
        self
    }
}

/// The three acronym tables consulted in cascade order by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct DictionarySet {
    pub general: Vec<AcronymEntry>,
    pub equipment: HashMap<String, Vec<AcronymEntry>>,
    pub vendor: HashMap<String, Vec<AcronymEntry>>,
}

/// Find the highest-priority entry in `entries` whose token matches `token`
/// case-insensitively. Ties are broken by first occurrence in load order —
/// this is the rule §9 mandates for the stray `CCW` re-definition, and it
/// applies uniformly to every lookup, not just that one token.
pub fn lookup_entry<'a>(entries: &'a [AcronymEntry], token: &str) -> Option<&'a AcronymEntry> {
    let mut best: Option<&AcronymEntry> = None;
    for entry in entries {
        if entry.token.eq_ignore_ascii_case(token) {
            match best {
                None => best = Some(entry),
                Some(current) if entry.priority > current.priority => best = Some(entry),
                _ => {}
            }
        }
    }
    best
}

impl DictionarySet {
    pub fn lookup_general(&self, token: &str) -> Option<&AcronymEntry> {
        lookup_entry(&self.general, token)
    }

    pub fn lookup_equipment(&self, equipment_type: &str, token: &str) -> Option<&AcronymEntry> {
        self.equipment
            .get(&equipment_type.to_uppercase())
            .and_then(|entries| lookup_entry(entries, token))
    }

    pub fn lookup_vendor(&self, vendor: &str, token: &str) -> Option<&AcronymEntry> {
        self.vendor
            .get(&vendor.to_uppercase())
            .and_then(|entries| lookup_entry(entries, token))
    }
}

/// The built-in general/equipment/vendor dictionaries. A real deployment
/// would load these from the JSON/YAML records described in §6; this is the
/// code-embedded table the spec allows as an equivalent serialization.
pub fn builtin_dictionaries() -> DictionarySet {
    DictionarySet {
        general: general_table(),
        equipment: equipment_tables(),
        vendor: vendor_tables(),
    }
}

fn general_table() -> Vec<AcronymEntry> {
    vec![
        AcronymEntry::new("SA", "Supply Air", "location", 9, &["supply", "air"]),
        AcronymEntry::new("RA", "Return Air", "location", 9, &["return", "air"]),
        AcronymEntry::new("OA", "Outside Air", "location", 9, &["outside", "air"]),
        AcronymEntry::new("EA", "Exhaust Air", "location", 8, &["exhaust", "air"]),
        AcronymEntry::new("ZN", "Zone", "location", 8, &["zone"]),
        AcronymEntry::new("RM", "Room", "location", 7, &["room"]),
        AcronymEntry::new("ROOM", "Room", "location", 8, &["room"]),
        AcronymEntry::new("MA", "Mixed Air", "location", 7, &["mixed", "air"]),
        AcronymEntry::new("DA", "Discharge Air", "location", 7, &["discharge", "air"]),
        AcronymEntry::new("T", "Temperature", "measurement", 6, &["temp"]),
        AcronymEntry::new("TEMP", "Temperature", "measurement", 9, &["temp"]),
        AcronymEntry::new("TS", "Temperature Sensor", "measurement", 8, &["temp", "sensor"]),
        AcronymEntry::new("HUM", "Humidity", "measurement", 8, &["humidity"]),
        AcronymEntry::new("RH", "Relative Humidity", "measurement", 8, &["humidity"]),
        AcronymEntry::new("PRESS", "Pressure", "measurement", 8, &["pressure"]),
        AcronymEntry::new("DP", "Differential Pressure", "measurement", 7, &["pressure"]),
        AcronymEntry::new("FLOW", "Flow", "measurement", 8, &["flow"]),
        AcronymEntry::new("CFM", "Airflow", "measurement", 7, &["flow", "air"]),
        AcronymEntry::new("PWR", "Power", "measurement", 7, &["power", "elec"]),
        AcronymEntry::new("KW", "Kilowatts", "measurement", 7, &["power", "elec"]),
        AcronymEntry::new("LVL", "Level", "measurement", 6, &["level"]),
        AcronymEntry::new("CO2", "Carbon Dioxide", "measurement", 8, &["co2", "air"]),
        AcronymEntry::new("SP", "Setpoint", "function", 9, &["sp"])
            .with_function(PointFunction::Setpoint),
        AcronymEntry::new("SETPT", "Setpoint", "function", 9, &["sp"])
            .with_function(PointFunction::Setpoint),
        AcronymEntry::new("STPT", "Setpoint", "function", 9, &["sp"])
            .with_function(PointFunction::Setpoint),
        AcronymEntry::new("CMD", "Command", "function", 9, &["cmd"])
            .with_function(PointFunction::Command),
        AcronymEntry::new("CMMD", "Command", "function", 8, &["cmd"])
            .with_function(PointFunction::Command),
        AcronymEntry::new("STAT", "Status", "function", 8, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("STATUS", "Status", "function", 9, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("ALM", "Alarm", "function", 8, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("ALARM", "Alarm", "function", 8, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("FAIL", "Failure", "function", 8, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("RUN", "Run", "function", 7, &["status"])
            .with_function(PointFunction::Status),
        AcronymEntry::new("POS", "Position", "function", 8, &["position"]),
        AcronymEntry::new("POSITION", "Position", "function", 8, &["position"]),
        AcronymEntry::new("DMPR", "Damper", "entity", 8, &["damper"]),
        AcronymEntry::new("DAMPER", "Damper", "entity", 8, &["damper"]),
        AcronymEntry::new("VLV", "Valve", "entity", 8, &["valve"]),
        AcronymEntry::new("VALVE", "Valve", "entity", 8, &["valve"]),
        AcronymEntry::new("FAN", "Fan", "entity", 8, &["fan"]),
        AcronymEntry::new("HGR", "Heat Gain Recovery", "entity", 5, &[]),
        AcronymEntry::new("SIG", "Signal", "entity", 5, &[]),
        AcronymEntry::new("OCC", "Occupied", "state", 7, &[]),
        AcronymEntry::new("UNOCC", "Unoccupied", "state", 7, &[]),
        AcronymEntry::new("ENB", "Enable", "function", 6, &[]),
        AcronymEntry::new("ENABLE", "Enable", "function", 6, &[]),
        // §9's stray CCW re-definition. Same priority on both rows so the
        // tie is broken purely by load order — clockwise loses.
        AcronymEntry::new("CCW", "Clockwise", "direction", 5, &[]),
        AcronymEntry::new("CCW", "Counterclockwise", "direction", 5, &[]),
    ]
}

fn equipment_tables() -> HashMap<String, Vec<AcronymEntry>> {
    let mut map = HashMap::new();
    map.insert(
        "VAV_CONTROLLER".to_string(),
        vec![
            AcronymEntry::new("BOX", "Terminal Box", "entity", 9, &[]),
            AcronymEntry::new("MIN", "Minimum", "function", 8, &[]),
            AcronymEntry::new("MAX", "Maximum", "function", 8, &[]),
        ],
    );
    map.insert(
        "AHU".to_string(),
        vec![
            AcronymEntry::new("PREHT", "Preheat", "entity", 9, &["air"]),
            AcronymEntry::new("REHT", "Reheat", "entity", 9, &["air"]),
            AcronymEntry::new("ECON", "Economizer", "entity", 9, &["air"]),
        ],
    );
    map
}

fn vendor_tables() -> HashMap<String, Vec<AcronymEntry>> {
    let mut map = HashMap::new();
    map.insert(
        "JOHNSON".to_string(),
        vec![AcronymEntry::new("N2", "Network Bus", "protocol", 7, &[])],
    );
    map.insert(
        "SIEMENS".to_string(),
        vec![AcronymEntry::new("PPCL", "Custom Program", "protocol", 6, &[])],
    );
    map
}

/// Failure modes for loading a `DictionarySet` from an external JSON
/// document (§4.8). This is the one entry point in the core that reports a
/// typed error instead of degrading gracefully — every other operation
/// named in §6 is total.
#[derive(Debug, Error)]
pub enum DictionaryLoadError {
    #[error("malformed dictionary document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read dictionary document: {0}")]
    Io(#[from] std::io::Error),

    #[error("entry '{token}' in table '{table}' has priority {priority}, outside the allowed 1..=10 range")]
    PriorityOutOfRange {
        table: String,
        token: String,
        priority: u8,
    },

    #[error("entry '{token}' in table '{table}' names an unrecognized impliedFunction '{value}'")]
    UnknownPointFunction {
        table: String,
        token: String,
        value: String,
    },
}

/// The wire shape of one acronym entry as it appears in an external JSON
/// dictionary document (§4.8): `{token, expansion, category, priority,
/// suggestedTags?, impliedFunction?}`. `impliedFunction` is carried as a raw
/// string here so an unrecognized value can be reported as a
/// `DictionaryLoadError` rather than silently failing deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntry {
    token: String,
    expansion: String,
    category: String,
    priority: u8,
    #[serde(default)]
    suggested_tags: Vec<String>,
    #[serde(default)]
    implied_function: Option<String>,
}

impl WireEntry {
    fn into_entry(self, table: &str) -> Result<AcronymEntry, DictionaryLoadError> {
        if !(1..=10).contains(&self.priority) {
            return Err(DictionaryLoadError::PriorityOutOfRange {
                table: table.to_string(),
                token: self.token,
                priority: self.priority,
            });
        }
        let implied_function = match self.implied_function {
            None => None,
            Some(value) => Some(parse_point_function(&value).ok_or_else(|| {
                DictionaryLoadError::UnknownPointFunction {
                    table: table.to_string(),
                    token: self.token.clone(),
                    value: value.clone(),
                }
            })?),
        };
        Ok(AcronymEntry {
            token: self.token,
            expansion: self.expansion,
            category: self.category,
            priority: self.priority,
            suggested_tags: self.suggested_tags,
            implied_function,
        })
    }
}

fn parse_point_function(s: &str) -> Option<PointFunction> {
    match s.to_lowercase().as_str() {
        "sensor" => Some(PointFunction::Sensor),
        "setpoint" => Some(PointFunction::Setpoint),
        "command" => Some(PointFunction::Command),
        "status" => Some(PointFunction::Status),
        "unknown" => Some(PointFunction::Unknown),
        _ => None,
    }
}

/// The external JSON document shape for a full dictionary set (§4.8, §6):
/// a `general` array plus `equipment`/`vendor` maps keyed by equipment-type
/// or vendor name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DictionaryDocument {
    #[serde(default)]
    general: Vec<WireEntry>,
    #[serde(default)]
    equipment: HashMap<String, Vec<WireEntry>>,
    #[serde(default)]
    vendor: HashMap<String, Vec<WireEntry>>,
}

fn convert_table(table: &str, entries: Vec<WireEntry>) -> Result<Vec<AcronymEntry>, DictionaryLoadError> {
    entries.into_iter().map(|e| e.into_entry(table)).collect()
}

fn convert_grouped_tables(
    groups: HashMap<String, Vec<WireEntry>>,
) -> Result<HashMap<String, Vec<AcronymEntry>>, DictionaryLoadError> {
    groups
        .into_iter()
        .map(|(key, entries)| {
            let converted = convert_table(&key, entries)?;
            Ok((key.to_uppercase(), converted))
        })
        .collect()
}

/// `load_dictionaries(reader) → Result<DictionarySet, DictionaryLoadError>`
/// (§4.8). Parses a JSON dictionary document and validates every entry's
/// priority range and `impliedFunction` string; this is additive alongside
/// `builtin_dictionaries()`, never a replacement for it.
pub fn load_dictionaries<R: Read>(mut reader: R) -> Result<DictionarySet, DictionaryLoadError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let doc: DictionaryDocument = serde_json::from_str(&buf)?;

    Ok(DictionarySet {
        general: convert_table("general", doc.general)?,
        equipment: convert_grouped_tables(doc.equipment)?,
        vendor: convert_grouped_tables(doc.vendor)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let dict = builtin_dictionaries();
        assert!(dict.lookup_general("sa").is_some());
        assert!(dict.lookup_general("SA").is_some());
    }

    #[test]
    fn unknown_token_misses() {
        let dict = builtin_dictionaries();
        assert!(dict.lookup_general("XQZZY").is_none());
    }

    #[test]
    fn ccw_tie_break_favors_first_occurrence_at_equal_priority() {
        let dict = builtin_dictionaries();
        let hit = dict.lookup_general("CCW").unwrap();
        assert_eq!(hit.expansion, "Clockwise");
    }

    #[test]
    fn equipment_table_scoped_by_equipment_type() {
        let dict = builtin_dictionaries();
        assert!(dict.lookup_equipment("VAV_CONTROLLER", "BOX").is_some());
        assert!(dict.lookup_equipment("AHU", "BOX").is_none());
    }

    #[test]
    fn vendor_table_scoped_by_vendor() {
        let dict = builtin_dictionaries();
        assert!(dict.lookup_vendor("JOHNSON", "N2").is_some());
        assert!(dict.lookup_vendor("SIEMENS", "N2").is_none());
    }

    #[test]
    fn higher_priority_wins_over_earlier_lower_priority_entry() {
        let entries = vec![
            AcronymEntry::new("X", "Low", "c", 3, &[]),
            AcronymEntry::new("X", "High", "c", 9, &[]),
        ];
        let hit = lookup_entry(&entries, "X").unwrap();
        assert_eq!(hit.expansion, "High");
    }

    #[test]
    fn load_dictionaries_parses_a_well_formed_document() {
        let json = r#"{
            "general": [
                {"token": "SA", "expansion": "Supply Air", "category": "location", "priority": 9, "suggestedTags": ["supply", "air"]},
                {"token": "SP", "expansion": "Setpoint", "category": "function", "priority": 9, "impliedFunction": "setpoint"}
            ],
            "equipment": {
                "AHU": [
                    {"token": "ECON", "expansion": "Economizer", "category": "entity", "priority": 8}
                ]
            },
            "vendor": {}
        }"#;
        let dict = load_dictionaries(json.as_bytes()).expect("valid document loads");
        assert!(dict.lookup_general("SA").is_some());
        assert_eq!(
            dict.lookup_general("SP").unwrap().implied_function,
            Some(PointFunction::Setpoint)
        );
        assert!(dict.lookup_equipment("AHU", "ECON").is_some());
    }

    #[test]
    fn load_dictionaries_rejects_malformed_json() {
        let err = load_dictionaries("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, DictionaryLoadError::Json(_)));
    }

    #[test]
    fn load_dictionaries_rejects_priority_out_of_range() {
        let json = r#"{"general": [{"token": "X", "expansion": "X", "category": "c", "priority": 11}]}"#;
        let err = load_dictionaries(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DictionaryLoadError::PriorityOutOfRange { .. }));
    }

    #[test]
    fn load_dictionaries_rejects_unknown_implied_function() {
        let json = r#"{"general": [{"token": "X", "expansion": "X", "category": "c", "priority": 5, "impliedFunction": "bogus"}]}"#;
        let err = load_dictionaries(json.as_bytes()).unwrap_err();
        assert!(matches!(err, DictionaryLoadError::UnknownPointFunction { .. }));
    }

    #[test]
    fn load_dictionaries_defaults_missing_tables_to_empty() {
        let json = r#"{"general": []}"#;
        let dict = load_dictionaries(json.as_bytes()).expect("missing tables default to empty");
        assert!(dict.equipment.is_empty());
        assert!(dict.vendor.is_empty());
    }
}

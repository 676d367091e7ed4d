//! Signature cache keyed on `(objectName, dictionary version)` (§3's
//! lifecycle note: a point's signature only needs to be recomputed when its
//! name changes or the dictionary set is upgraded).
//!
//! Reads no wall clock (§5) — `cached_at` is supplied by the caller.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::algo::dictionaries::DictionarySet;
use crate::model::PointSignature;

/// A stable fingerprint of a dictionary set's contents. Changes whenever any
/// acronym entry's token, expansion, priority, or tags change, or entries are
/// added/removed — but not when entries are merely reordered within a table.
pub fn dictionary_version(dict: &DictionarySet) -> u64 {
    let mut general: Vec<String> = dict.general.iter().map(entry_fingerprint).collect();
    general.sort();

    let mut equipment: Vec<String> = dict
        .equipment
        .iter()
        .flat_map(|(k, entries)| entries.iter().map(move |e| format!("{k}:{}", entry_fingerprint(e))))
        .collect();
    equipment.sort();

    let mut vendor: Vec<String> = dict
        .vendor
        .iter()
        .flat_map(|(k, entries)| entries.iter().map(move |e| format!("{k}:{}", entry_fingerprint(e))))
        .collect();
    vendor.sort();

    let mut hasher = SipHasher13::new();
    general.hash(&mut hasher);
    equipment.hash(&mut hasher);
    vendor.hash(&mut hasher);
    hasher.finish()
}

fn entry_fingerprint(e: &crate::algo::dictionaries::AcronymEntry) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        e.token,
        e.expansion,
        e.category,
        e.priority,
        e.suggested_tags.join(",")
    )
}

fn cache_key(object_name: &str, dictionary_version: u64) -> u64 {
    let mut hasher = SipHasher13::new();
    object_name.to_lowercase().hash(&mut hasher);
    dictionary_version.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSignature {
    pub signature: PointSignature,
    pub dictionary_version: u64,
    pub cached_at: i64,
}

/// An in-memory signature cache. A persistence layer can snapshot/restore the
/// map through `entries`/`load` without this module knowing about storage.
#[derive(Debug, Clone, Default)]
pub struct SignatureCache {
    entries: HashMap<u64, CachedSignature>,
}

impl SignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, object_name: &str, dictionary_version: u64) -> Option<&PointSignature> {
        self.entries
            .get(&cache_key(object_name, dictionary_version))
            .filter(|c| c.dictionary_version == dictionary_version)
            .map(|c| &c.signature)
    }

    pub fn put(&mut self, object_name: &str, dictionary_version: u64, signature: PointSignature, cached_at: i64) {
        let key = cache_key(object_name, dictionary_version);
        self.entries.insert(
            key,
            CachedSignature {
                signature,
                dictionary_version,
                cached_at,
            },
        );
    }

    /// Drop every cached entry whose dictionary version no longer matches
    /// `current_version` — called after a dictionary upgrade.
    pub fn evict_stale(&mut self, current_version: u64) {
        self.entries.retain(|_, c| c.dictionary_version == current_version);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::dictionaries::builtin_dictionaries;
    use crate::model::{ConfidenceLevel, ObjectType, PointFunction};

    fn sample_signature() -> PointSignature {
        PointSignature {
            pattern: "*ROOM*TEMPERATURE*".to_string(),
            normalized_pattern: "ROOMTEMPERATURE".to_string(),
            keywords: vec!["room".to_string(), "temperature".to_string()],
            confidence: 0.85,
            specificity: 0.70,
            point_function: PointFunction::Sensor,
            object_type: Some(ObjectType::AI),
            units: Some("°F".to_string()),
            match_count: 0,
            successful_matches: 0,
        }
    }

    #[test]
    fn dictionary_version_is_deterministic() {
        let dict = builtin_dictionaries();
        assert_eq!(dictionary_version(&dict), dictionary_version(&dict));
    }

    #[test]
    fn put_then_get_round_trips() {
        let dict = builtin_dictionaries();
        let version = dictionary_version(&dict);
        let mut cache = SignatureCache::new();
        cache.put("RM-1-T", version, sample_signature(), 100);
        let hit = cache.get("RM-1-T", version);
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().pattern, "*ROOM*TEMPERATURE*");
    }

    #[test]
    fn lookup_is_case_insensitive_on_object_name() {
        let dict = builtin_dictionaries();
        let version = dictionary_version(&dict);
        let mut cache = SignatureCache::new();
        cache.put("RM-1-T", version, sample_signature(), 100);
        assert!(cache.get("rm-1-t", version).is_some());
    }

    #[test]
    fn miss_on_dictionary_version_change() {
        let dict = builtin_dictionaries();
        let version = dictionary_version(&dict);
        let mut cache = SignatureCache::new();
        cache.put("RM-1-T", version, sample_signature(), 100);
        assert!(cache.get("RM-1-T", version.wrapping_add(1)).is_none());
    }

    #[test]
    fn evict_stale_drops_old_version_entries() {
        let dict = builtin_dictionaries();
        let v1 = dictionary_version(&dict);
        let v2 = v1.wrapping_add(1);
        let mut cache = SignatureCache::new();
        cache.put("RM-1-T", v1, sample_signature(), 100);
        cache.put("RM-2-T", v2, sample_signature(), 100);
        cache.evict_stale(v2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("RM-2-T", v2).is_some());
    }
}

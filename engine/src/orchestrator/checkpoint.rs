//! Checkpoint - save/resume engine state
//!
//! # Critical Invariants
//!
//! - **Determinism**: restoring and replaying the same ensembles yields the
//!   same accepted sets as an uninterrupted run
//! - **Config Matching**: a snapshot only loads with the config it was
//!   taken under (SHA-256 over canonical JSON)

use crate::adaptation::ManagerSnapshot;
use crate::orchestrator::EngineError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Complete cross-iteration engine state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Index of the next iteration to run
    pub iteration: usize,

    /// RNG state at snapshot time (not the seed)
    pub rng_state: u64,

    /// (T, R), window and impossible-reduction counter
    pub manager: ManagerSnapshot,

    /// Hash of the config the snapshot was taken under
    pub config_hash: String,
}

impl EngineSnapshot {
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self)
            .map_err(|e| EngineError::SerializationError(format!("Snapshot serialization failed: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::SerializationError(format!("Snapshot parse failed: {}", e)))
    }
}

/// SHA-256 of `config` serialized with sorted object keys
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, EngineError> {
    let digest = Sha256::digest(canonical_json(config)?.as_bytes());
    Ok(format!("{:x}", digest))
}

/// Compact JSON with every object's keys in lexicographic order
///
/// `serde_json::Map` without `preserve_order` is a `BTreeMap`, so a
/// round trip through `Value` sorts keys at every depth.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, EngineError> {
    serde_json::to_value(value)
        .and_then(|v| serde_json::to_string(&v))
        .map_err(|e| EngineError::SerializationError(format!("Config serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptation::{GapSample, TrustRegionState};
    use crate::orchestrator::EngineConfig;

    #[test]
    fn test_config_hash_deterministic() {
        let a = compute_config_hash(&EngineConfig::default()).unwrap();
        let b = compute_config_hash(&EngineConfig::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_config_hash_changes_with_seed() {
        let other = EngineConfig {
            rng_seed: 1,
            ..EngineConfig::default()
        };
        assert_ne!(
            compute_config_hash(&EngineConfig::default()).unwrap(),
            compute_config_hash(&other).unwrap()
        );
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let snapshot = EngineSnapshot {
            iteration: 12,
            rng_state: 0xDEAD_BEEF,
            manager: ManagerSnapshot {
                state: TrustRegionState {
                    trust_region: 4,
                    replications: 8,
                },
                impossible_reductions: 1,
                window: vec![GapSample::new(11, vec![0.5, 0.25])],
            },
            config_hash: "abc".to_string(),
        };

        let restored = EngineSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = serde_json::json!({ "b": { "z": 1, "a": 2 }, "a": [ { "y": 0, "x": 0 } ] });
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":[{"x":0,"y":0}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn test_malformed_snapshot_rejected() {
        assert!(matches!(
            EngineSnapshot::from_json("{\"iteration\": 1}"),
            Err(EngineError::SerializationError(_))
        ));
    }
}

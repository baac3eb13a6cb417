//! Per-layer degree caps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::canonical::canonical_hash_hex;
use crate::types::Layer;
use super::ConfigError;

/// Built-in school-layer cap.
pub const DEFAULT_SCHOOL_CAP: u32 = 20;

/// Built-in work-layer cap.
pub const DEFAULT_WORK_CAP: u32 = 20;

/// Maximum contacts per individual for each targeted layer.
///
/// Every stored cap is at least 1; layers without an entry are not trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeCaps {
    caps: BTreeMap<Layer, u32>,
}

impl DegreeCaps {
    /// Caps with no targeted layers.
    pub fn empty() -> Self {
        Self { caps: BTreeMap::new() }
    }

    /// The built-in caps: `{S: 20, W: 20}`.
    pub fn defaults() -> Self {
        let mut caps = BTreeMap::new();
        caps.insert(Layer::School, DEFAULT_SCHOOL_CAP);
        caps.insert(Layer::Work, DEFAULT_WORK_CAP);
        Self { caps }
    }

    /// Set the cap for any layer.
    ///
    /// Used by callers re-trimming an existing population; request-level
    /// overrides go through [`DegreeCaps::merge_overrides`], which restricts
    /// the accepted layers.
    pub fn set(&mut self, layer: Layer, cap: i64) -> Result<(), ConfigError> {
        let cap = validate_cap(layer.code(), cap)?;
        self.caps.insert(layer, cap);
        Ok(())
    }

    /// Builder form of [`DegreeCaps::set`].
    pub fn with(mut self, layer: Layer, cap: i64) -> Result<Self, ConfigError> {
        self.set(layer, cap)?;
        Ok(self)
    }

    /// Merge caller overrides keyed by layer code over these caps.
    ///
    /// Override wins per key; layers not mentioned keep their current cap.
    /// Only overridable layers (`S`, `W`) are accepted.
    pub fn merge_overrides(&self, overrides: &BTreeMap<String, i64>) -> Result<Self, ConfigError> {
        let mut merged = self.clone();
        for (code, value) in overrides {
            let layer = Layer::from_code(code)
                .filter(Layer::is_cap_overridable)
                .ok_or_else(|| ConfigError::UnsupportedCapLayer { layer: code.clone() })?;
            merged.caps.insert(layer, validate_cap(code, *value)?);
        }
        Ok(merged)
    }

    /// Cap for a layer, if targeted.
    pub fn get(&self, layer: Layer) -> Option<u32> {
        self.caps.get(&layer).copied()
    }

    /// Targeted layers with their caps, in canonical layer order.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, u32)> + '_ {
        self.caps.iter().map(|(layer, cap)| (*layer, *cap))
    }

    /// Number of targeted layers.
    pub fn len(&self) -> usize {
        self.caps.len()
    }

    /// Whether no layer is targeted.
    pub fn is_empty(&self) -> bool {
        self.caps.is_empty()
    }

    /// Stable hash of the caps, for logs and reports.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&self.caps)
    }
}

impl Default for DegreeCaps {
    fn default() -> Self {
        Self::defaults()
    }
}

fn validate_cap(layer: &str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value)
        .ok()
        .filter(|cap| *cap >= 1)
        .ok_or_else(|| ConfigError::InvalidDegreeCap {
            layer: layer.to_string(),
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_merge_keeps_unspecified_defaults() {
        let merged = DegreeCaps::defaults()
            .merge_overrides(&overrides(&[("S", 5)]))
            .unwrap();
        assert_eq!(merged.get(Layer::School), Some(5));
        assert_eq!(merged.get(Layer::Work), Some(DEFAULT_WORK_CAP));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let merged = DegreeCaps::defaults().merge_overrides(&BTreeMap::new()).unwrap();
        assert_eq!(merged, DegreeCaps::defaults());
    }

    #[test]
    fn test_rejects_non_positive_cap() {
        for bad in [0, -3] {
            let err = DegreeCaps::defaults()
                .merge_overrides(&overrides(&[("W", bad)]))
                .unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidDegreeCap { layer: "W".to_string(), value: bad }
            );
        }
        assert!(DegreeCaps::empty().with(Layer::Household, 0).is_err());
    }

    #[test]
    fn test_rejects_non_overridable_layer() {
        for code in ["H", "C", "LTCF", "X"] {
            let err = DegreeCaps::defaults()
                .merge_overrides(&overrides(&[(code, 4)]))
                .unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedCapLayer { .. }));
        }
    }

    #[test]
    fn test_set_allows_any_layer() {
        let caps = DegreeCaps::empty().with(Layer::Community, 3).unwrap();
        assert_eq!(caps.get(Layer::Community), Some(3));
        assert_eq!(caps.get(Layer::School), None);
    }

    #[test]
    fn test_params_hash_stable() {
        assert_eq!(DegreeCaps::defaults().params_hash(), DegreeCaps::default().params_hash());
        let other = DegreeCaps::defaults().with(Layer::School, 5).unwrap();
        assert_ne!(DegreeCaps::defaults().params_hash(), other.params_hash());
    }
}

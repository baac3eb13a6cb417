//! Contact layer labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named category of social contact.
///
/// Ordered so that per-layer iteration (trimming, normalization,
/// serialization) is deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Household contacts (`H`).
    #[serde(rename = "H")]
    Household,
    /// School contacts (`S`).
    #[serde(rename = "S")]
    School,
    /// Workplace contacts (`W`).
    #[serde(rename = "W")]
    Work,
    /// Community contacts (`C`).
    #[serde(rename = "C")]
    Community,
    /// Long-term-care facility contacts (`LTCF`).
    #[serde(rename = "LTCF")]
    LongTermCare,
}

impl Layer {
    /// All layers in canonical order.
    pub const ALL: [Layer; 5] = [
        Layer::Household,
        Layer::School,
        Layer::Work,
        Layer::Community,
        Layer::LongTermCare,
    ];

    /// Layers produced by the general synthetic generator.
    pub const GENERAL: [Layer; 4] = [
        Layer::Household,
        Layer::School,
        Layer::Work,
        Layer::Community,
    ];

    /// Short code used as the key in normalized output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Household => "H",
            Self::School => "S",
            Self::Work => "W",
            Self::Community => "C",
            Self::LongTermCare => "LTCF",
        }
    }

    /// Parse layer from its code.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "H" => Some(Self::Household),
            "S" => Some(Self::School),
            "W" => Some(Self::Work),
            "C" => Some(Self::Community),
            "LTCF" => Some(Self::LongTermCare),
            _ => None,
        }
    }

    /// Whether callers may override the degree cap of this layer.
    pub fn is_cap_overridable(&self) -> bool {
        matches!(self, Self::School | Self::Work)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_code(layer.code()), Some(layer));
        }
        assert_eq!(Layer::from_code("X"), None);
        assert_eq!(Layer::from_code("s"), None);
    }

    #[test]
    fn test_serde_uses_code() {
        let json = serde_json::to_string(&Layer::LongTermCare).unwrap();
        assert_eq!(json, r#""LTCF""#);
    }

    #[test]
    fn test_only_school_and_work_overridable() {
        let overridable: Vec<_> = Layer::ALL.iter().filter(|l| l.is_cap_overridable()).collect();
        assert_eq!(overridable, vec![&Layer::School, &Layer::Work]);
    }
}

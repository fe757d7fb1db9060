//! Configuration for the layout engine and anchored extraction engine.

use serde::{Deserialize, Serialize};

/// Tunable constants for the layout engine and the anchored extraction
/// engine. The core is pure compute and has very little that is actually
/// configurable; these are the handful of constants called out by name in
/// the component design rather than hardcoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGridConfig {
    /// Minimum width, in columns, of a blank-column run for it to count as
    /// a vertical XY-cut gap.
    pub min_gap: usize,

    /// Maximum same-line column distance for a `Left`/`Right` anchor
    /// relation.
    pub max_horizontal_distance: usize,

    /// Maximum line-number distance for an `Above`/`Below` anchor relation.
    pub max_vertical_distance: usize,

    /// Column tolerance when checking whether an anchor and a value align
    /// vertically for an `Above`/`Below` relation.
    pub column_tolerance: usize,
}

impl Default for TextGridConfig {
    fn default() -> Self {
        Self {
            min_gap: 2,
            max_horizontal_distance: 30,
            max_vertical_distance: 2,
            column_tolerance: 10,
        }
    }
}

impl TextGridConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let cfg = TextGridConfig::default();
        assert_eq!(cfg.min_gap, 2);
        assert_eq!(cfg.max_horizontal_distance, 30);
        assert_eq!(cfg.max_vertical_distance, 2);
        assert_eq!(cfg.column_tolerance, 10);
    }

    #[test]
    fn round_trips_through_json_file() {
        let dir = std::env::temp_dir().join("textgrid-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        let cfg = TextGridConfig {
            min_gap: 3,
            ..TextGridConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = TextGridConfig::from_file(&path).unwrap();
        assert_eq!(loaded.min_gap, 3);
        assert_eq!(loaded.max_horizontal_distance, 30);
    }
}

//! Cliff-tile pattern catalog.
//!
//! The catalog is data, not generated: a default is embedded in the binary via
//! `include_str!`, and a JSON file on disk can replace it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::direction::Dir;
use crate::error::{GenerationError, Result};

const DEFAULT_CATALOG_JSON: &str = include_str!("../data/cliff_catalog.json");

/// Name of the pattern used for ramp walls when a cliff declares no slope connection.
pub const SLOPE_FALLBACK: &str = "slope_fallback";

/// Index into [`CliffCatalog::patterns`].
pub type PatternId = usize;

/// One way of extending a cliff: place the owning pattern at `offset` from the
/// current tile while walking in `direction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CliffTileRule {
    pub offset: [i32; 2],
    pub direction: Dir,
    /// The pattern's geometry stops half way across the tile.
    #[serde(default)]
    pub ends_in_middle: bool,
}

/// A visual/topological cliff pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CliffTile {
    pub name: String,
    pub rules: Vec<CliffTileRule>,
    /// Per rule: may a walk arriving from `[west, north, south]` merge into this tile.
    #[serde(default)]
    pub overlaps: Vec<[bool; 3]>,
    /// Legal as the last tile of a walk that runs into the map edge.
    #[serde(default)]
    pub is_end_tile: bool,
    #[serde(default)]
    pub slope_higher: Option<PatternId>,
    #[serde(default)]
    pub slope_lower: Option<PatternId>,
}

impl CliffTile {
    /// Whether a walk moving `forward` may merge into a tile placed with `rule`.
    pub fn accepts_merge(&self, rule: usize, forward: Dir) -> bool {
        let Some(row) = self.overlaps.get(rule) else {
            return true;
        };
        match forward {
            Dir::East => row[0],
            Dir::South => row[1],
            Dir::North => row[2],
            // Walks never travel west; treat it like an eastern approach.
            Dir::West => row[0],
        }
    }
}

/// A catalog rule addressed by owning pattern and rule index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleRef {
    pub pattern: PatternId,
    pub rule: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliffCatalog {
    pub patterns: Vec<CliffTile>,
}

impl CliffCatalog {
    /// Parse the catalog compiled into the binary.
    pub fn defaults() -> Result<Self> {
        Self::from_json(DEFAULT_CATALOG_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: CliffCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a replacement catalog from disk.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn get(&self, id: PatternId) -> &CliffTile {
        &self.patterns[id]
    }

    pub fn rule(&self, r: RuleRef) -> &CliffTileRule {
        &self.patterns[r.pattern].rules[r.rule]
    }

    pub fn find(&self, name: &str) -> Option<PatternId> {
        self.patterns.iter().position(|p| p.name == name)
    }

    /// Every rule that extends a walk heading `forward`, in catalog order.
    pub fn rules_for(&self, forward: Dir) -> Vec<RuleRef> {
        let mut result = Vec::new();
        for (pattern, tile) in self.patterns.iter().enumerate() {
            for (rule, r) in tile.rules.iter().enumerate() {
                if r.direction == forward {
                    result.push(RuleRef { pattern, rule });
                }
            }
        }
        result
    }

    /// The straight pattern for a direction, used to open a walk.
    pub fn initial_pattern(&self, forward: Dir) -> PatternId {
        let (dx, dy) = forward.vector();
        self.rules_for(forward)
            .into_iter()
            .find(|r| self.rule(*r).offset == [dx, dy])
            .map(|r| r.pattern)
            .unwrap_or(0)
    }

    pub fn slope_fallback(&self) -> PatternId {
        self.find(SLOPE_FALLBACK).unwrap_or(0)
    }

    fn validate(&self) -> Result<()> {
        for dir in [Dir::South, Dir::East, Dir::North] {
            let (dx, dy) = dir.vector();
            let has_straight = self
                .rules_for(dir)
                .iter()
                .any(|r| self.rule(*r).offset == [dx, dy]);
            if !has_straight {
                return Err(GenerationError::Catalog(format!(
                    "no straight rule for walking {:?}",
                    dir
                )));
            }
        }
        for tile in &self.patterns {
            if !tile.overlaps.is_empty() && tile.overlaps.len() != tile.rules.len() {
                return Err(GenerationError::Catalog(format!(
                    "pattern '{}' has {} overlap rows for {} rules",
                    tile.name,
                    tile.overlaps.len(),
                    tile.rules.len()
                )));
            }
            for rule in &tile.rules {
                let [dx, dy] = rule.offset;
                if dx.abs() > 1 || dy.abs() > 1 || (dx == 0 && dy == 0) {
                    return Err(GenerationError::Catalog(format!(
                        "pattern '{}' has non-adjacent offset {:?}",
                        tile.name, rule.offset
                    )));
                }
                let (fx, fy) = rule.direction.vector();
                if dx * fx + dy * fy <= 0 {
                    return Err(GenerationError::Catalog(format!(
                        "pattern '{}' has a rule that does not advance {:?}",
                        tile.name, rule.direction
                    )));
                }
            }
            for slope in [tile.slope_higher, tile.slope_lower].into_iter().flatten() {
                if slope >= self.patterns.len() {
                    return Err(GenerationError::Catalog(format!(
                        "pattern '{}' references missing slope pattern {}",
                        tile.name, slope
                    )));
                }
            }
        }
        if self.find(SLOPE_FALLBACK).is_none() {
            return Err(GenerationError::Catalog(format!("missing '{}' pattern", SLOPE_FALLBACK)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = CliffCatalog::defaults().unwrap();
        assert_eq!(catalog.rules_for(Dir::South).len(), 3);
        assert_eq!(catalog.rules_for(Dir::East).len(), 3);
        assert_eq!(catalog.rules_for(Dir::North).len(), 3);
        assert!(catalog.rules_for(Dir::West).is_empty());
        assert_eq!(catalog.get(catalog.initial_pattern(Dir::East)).name, "wall_e");
    }

    #[test]
    fn test_slope_connections_point_at_slope_walls() {
        let catalog = CliffCatalog::defaults().unwrap();
        let wall = catalog.get(catalog.find("wall_e").unwrap());
        assert_eq!(catalog.get(wall.slope_higher.unwrap()).name, "slope_wall_high");
        assert_eq!(catalog.get(wall.slope_lower.unwrap()).name, "slope_wall_low");
    }

    #[test]
    fn test_rejects_rule_that_does_not_advance() {
        let json = r#"{"patterns": [
            {"name": "wall_s", "rules": [{"offset": [0, 1], "direction": "south"}]},
            {"name": "wall_e", "rules": [{"offset": [1, 0], "direction": "east"}]},
            {"name": "wall_n", "rules": [{"offset": [0, -1], "direction": "north"}]},
            {"name": "bad", "rules": [{"offset": [0, -1], "direction": "south"}]},
            {"name": "slope_fallback", "rules": []}
        ]}"#;
        assert!(matches!(CliffCatalog::from_json(json), Err(GenerationError::Catalog(_))));
    }
}

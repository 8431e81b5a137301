//! Catalogue records: the JSON-shaped configuration documents the engine
//! loads once at startup and treats as immutable afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Resource, StockKind};

/// Composition rule for a building type's morale contribution when a fiefdom
/// holds several operational copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoraleEffectMode {
    #[default]
    Add,
    Max,
    Multiply,
}

/// Periodic output of one resource by an operational building.
///
/// `periodicity` is in hours. With `amount_multiplier == 1` every full cycle
/// yields `amount`; otherwise cycle `n` yields `amount * multiplier^(n-1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSpec {
    pub amount: f64,
    #[serde(default = "default_multiplier")]
    pub amount_multiplier: f64,
    pub periodicity: f64,
    #[serde(default = "default_multiplier")]
    pub periodicity_multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// One entry of the building catalogue. Cost and construction-time arrays are
/// indexed by level transition: entry `k` covers going from level `k` to
/// `k + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingTypeConfig {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_max_level")]
    pub max_level: i64,
    #[serde(default = "default_dimension")]
    pub width: i64,
    #[serde(default = "default_dimension")]
    pub height: i64,
    #[serde(default)]
    pub gold_cost: Vec<i64>,
    #[serde(default)]
    pub wood_cost: Vec<i64>,
    #[serde(default)]
    pub stone_cost: Vec<i64>,
    #[serde(default)]
    pub steel_cost: Vec<i64>,
    #[serde(default)]
    pub bronze_cost: Vec<i64>,
    #[serde(default)]
    pub grain_cost: Vec<i64>,
    #[serde(default)]
    pub leather_cost: Vec<i64>,
    #[serde(default)]
    pub mana_cost: Vec<i64>,
    #[serde(default)]
    pub construction_times: Vec<i64>,
    #[serde(default)]
    pub morale_boost: Option<f64>,
    #[serde(default)]
    pub morale_effect_mode: MoraleEffectMode,
    #[serde(default)]
    pub production: BTreeMap<StockKind, ProductionSpec>,
}

fn default_max_level() -> i64 {
    1
}

fn default_dimension() -> i64 {
    1
}

impl BuildingTypeConfig {
    pub fn cost_curve(&self, resource: Resource) -> &[i64] {
        match resource {
            Resource::Gold => &self.gold_cost,
            Resource::Wood => &self.wood_cost,
            Resource::Stone => &self.stone_cost,
            Resource::Steel => &self.steel_cost,
            Resource::Bronze => &self.bronze_cost,
            Resource::Grain => &self.grain_cost,
            Resource::Leather => &self.leather_cost,
            Resource::Mana => &self.mana_cost,
        }
    }
}

/// One wall generation: a hollow rectangular perimeter centred at the origin,
/// `width x length` outer extent with an outer skin of `thickness`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WallGenerationConfig {
    pub width: i64,
    pub length: i64,
    pub thickness: i64,
    #[serde(default)]
    pub gold_cost: Vec<i64>,
    #[serde(default)]
    pub stone_cost: Vec<i64>,
    #[serde(default)]
    pub hp: Vec<i64>,
    #[serde(default)]
    pub construction_times: Vec<i64>,
    #[serde(default)]
    pub morale_boost: Vec<f64>,
}

impl WallGenerationConfig {
    /// A wall's maximum level is bounded by the length of its HP curve.
    pub fn max_level(&self) -> i64 {
        self.hp.len() as i64
    }

    /// Hit points at a 1-indexed level, extrapolated past the curve.
    pub fn hp_at(&self, level: i64) -> i64 {
        if level < 1 {
            return 0;
        }
        extrapolate_entry(&self.hp, (level - 1) as usize).unwrap_or(0)
    }

    pub fn cost_curve(&self, resource: Resource) -> &[i64] {
        const NONE: &[i64] = &[];
        match resource {
            Resource::Gold => &self.gold_cost,
            Resource::Stone => &self.stone_cost,
            _ => NONE,
        }
    }
}

/// The wall catalogue, keyed by generation number rendered as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallCatalog {
    pub walls: BTreeMap<String, WallGenerationConfig>,
}

impl WallCatalog {
    pub fn generation(&self, generation: i64) -> Option<&WallGenerationConfig> {
        self.walls.get(&generation.to_string())
    }
}

impl Default for WallCatalog {
    fn default() -> Self {
        let mut walls = BTreeMap::new();
        walls.insert("1".to_string(), default_generation_one());
        walls.insert("2".to_string(), default_generation_two());
        walls.insert("3".to_string(), default_generation_three());
        Self { walls }
    }
}

fn default_generation_one() -> WallGenerationConfig {
    WallGenerationConfig {
        width: 40,
        length: 40,
        thickness: 2,
        gold_cost: vec![500, 900, 1400],
        stone_cost: vec![800, 1400, 2100],
        hp: vec![1500, 2600, 3900],
        construction_times: vec![1800, 5400, 10800],
        morale_boost: vec![10.0, 16.0, 24.0],
    }
}

fn default_generation_two() -> WallGenerationConfig {
    WallGenerationConfig {
        width: 80,
        length: 80,
        thickness: 3,
        gold_cost: vec![1600, 2600, 3800],
        stone_cost: vec![2400, 3800, 5600],
        hp: vec![4200, 6500, 9200],
        construction_times: vec![7200, 14400, 28800],
        morale_boost: vec![20.0, 30.0, 42.0],
    }
}

fn default_generation_three() -> WallGenerationConfig {
    WallGenerationConfig {
        width: 140,
        length: 140,
        thickness: 4,
        gold_cost: vec![4200, 6400, 9000],
        stone_cost: vec![6000, 9000, 12800],
        hp: vec![11000, 16000, 22500],
        construction_times: vec![21600, 43200, 86400],
        morale_boost: vec![36.0, 52.0, 72.0],
    }
}

/// A per-level stat array with an optional hard cap applied beyond the
/// catalogue's length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCurve {
    #[serde(default)]
    pub values: Vec<i64>,
    #[serde(default)]
    pub max: i64,
}

impl StatCurve {
    pub fn at(&self, level: i64) -> i64 {
        extrapolate_with_max(&self.values, level, self.max)
    }
}

/// Read `values` at a 0-based index, extrapolating linearly from the last two
/// entries when the index overruns. Returns `None` for an empty array.
pub fn extrapolate_entry(values: &[i64], index: usize) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    if let Some(value) = values.get(index) {
        return Some(*value);
    }
    let last = values.len() - 1;
    if last == 0 {
        return Some(values[0]);
    }
    let slope = values[last] - values[last - 1];
    Some(values[last] + slope * (index - last) as i64)
}

/// Read a 1-indexed level from `values`, extrapolating past the end and
/// clamping to `max` when `max > 0`.
pub fn extrapolate_with_max(values: &[i64], level: i64, max: i64) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let index = (level - 1).max(0) as usize;
    let value = extrapolate_entry(values, index).unwrap_or(0);
    if max > 0 {
        value.min(max)
    } else {
        value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroTemplate {
    pub name: String,
    #[serde(default = "default_max_level")]
    pub max_level: i64,
    #[serde(default)]
    pub morale_boost: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatantTemplate {
    pub name: String,
    #[serde(default = "default_max_level")]
    pub max_level: i64,
    #[serde(default)]
    pub attack: StatCurve,
    #[serde(default)]
    pub defense: StatCurve,
    #[serde(default)]
    pub morale_boost: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialStatCurves {
    #[serde(default)]
    pub intelligence: StatCurve,
    #[serde(default)]
    pub charisma: StatCurve,
    #[serde(default)]
    pub wisdom: StatCurve,
    #[serde(default)]
    pub diligence: StatCurve,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficialTemplate {
    pub name: String,
    #[serde(default = "default_max_level")]
    pub max_level: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub portrait_id: i64,
    #[serde(default)]
    pub morale_boost: Vec<f64>,
    #[serde(default)]
    pub stats: OfficialStatCurves,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageType {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrapolation_extends_from_last_two_entries() {
        let times = [60, 120, 240];
        assert_eq!(extrapolate_entry(&times, 1), Some(120));
        assert_eq!(extrapolate_entry(&times, 3), Some(360));
        assert_eq!(extrapolate_entry(&times, 5), Some(600));
        assert_eq!(extrapolate_entry(&[], 0), None);
        assert_eq!(extrapolate_entry(&[42], 9), Some(42));
    }

    #[test]
    fn stat_curve_clamps_to_max() {
        let curve = StatCurve {
            values: vec![10, 20, 30],
            max: 45,
        };
        assert_eq!(curve.at(1), 10);
        assert_eq!(curve.at(3), 30);
        assert_eq!(curve.at(4), 40);
        assert_eq!(curve.at(6), 45);
    }

    #[test]
    fn wall_catalog_default_covers_three_generations() {
        let catalog = WallCatalog::default();
        assert!(catalog.generation(1).is_some());
        assert!(catalog.generation(3).is_some());
        assert!(catalog.generation(4).is_none());
        assert_eq!(catalog.generation(1).unwrap().max_level(), 3);
    }

    #[test]
    fn building_config_defaults_fill_in() {
        let config: BuildingTypeConfig = serde_json::from_str(r#"{"gold_cost": [100]}"#).unwrap();
        assert_eq!(config.max_level, 1);
        assert_eq!((config.width, config.height), (1, 1));
        assert_eq!(config.morale_effect_mode, MoraleEffectMode::Add);
        assert_eq!(config.cost_curve(crate::Resource::Gold), &[100]);
        assert!(config.cost_curve(crate::Resource::Mana).is_empty());
    }
}

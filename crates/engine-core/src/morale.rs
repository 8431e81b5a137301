//! Composes per-source morale contributions into one clamped fiefdom score.

use std::collections::BTreeMap;

use contracts::config::MoraleEffectMode;
use contracts::entities::FiefdomData;
use contracts::MORALE_BOUND;

use crate::config::ConfigCache;

pub fn clamp_morale(value: f64) -> f64 {
    value.clamp(-MORALE_BOUND, MORALE_BOUND)
}

/// Reads catalogue boosts for every morale source of a fiefdom snapshot.
/// Pure: the caller persists the score via `update_fiefdom_morale` if wanted.
#[derive(Debug, Clone, Copy)]
pub struct MoraleAggregator<'a> {
    config: &'a ConfigCache,
}

impl<'a> MoraleAggregator<'a> {
    pub fn new(config: &'a ConfigCache) -> Self {
        Self { config }
    }

    pub fn fiefdom_morale(&self, fiefdom: &FiefdomData) -> f64 {
        let mut total = 0.0;

        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for building in &fiefdom.buildings {
            if building.is_operational() {
                *counts.entry(building.name.as_str()).or_default() += 1;
            }
        }
        for (name, count) in counts {
            total += self.building_contribution(name, count);
        }

        for wall in &fiefdom.walls {
            if wall.level < 1 {
                continue;
            }
            if let Some(generation) = self.config.wall_generation(wall.generation) {
                total += level_indexed(&generation.morale_boost, wall.level);
            }
        }

        for official in &fiefdom.officials {
            if official.level < 1 {
                continue;
            }
            if let Some(template) = self.config.official_template(&official.template_id) {
                total += level_indexed(&template.morale_boost, official.level);
            }
        }

        for hero in &fiefdom.heroes {
            if hero.level < 1 {
                continue;
            }
            if let Some(template) = self.config.hero(&hero.hero_config_id) {
                total += level_indexed(&template.morale_boost, hero.level);
            }
        }

        for combatant in &fiefdom.stationed_combatants {
            if combatant.level < 1 {
                continue;
            }
            if let Some(template) = self.config.player_combatant(&combatant.combatant_config_id) {
                total += level_indexed(&template.morale_boost, combatant.level);
            }
        }

        clamp_morale(total)
    }

    fn building_contribution(&self, building_type: &str, count: u32) -> f64 {
        let Some(config) = self.config.building_type(building_type) else {
            return 0.0;
        };
        let Some(boost) = config.morale_boost else {
            return 0.0;
        };
        if count == 0 {
            return 0.0;
        }
        match config.morale_effect_mode {
            MoraleEffectMode::Add => boost * f64::from(count),
            MoraleEffectMode::Max => boost,
            MoraleEffectMode::Multiply => boost.powi(count as i32),
        }
    }
}

/// Level-indexed boost, clamped to the last entry when the level overruns.
fn level_indexed(boosts: &[f64], level: i64) -> f64 {
    if boosts.is_empty() || level < 1 {
        return 0.0;
    }
    let index = ((level - 1) as usize).min(boosts.len() - 1);
    boosts[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::config::{
        BuildingTypeConfig, HeroTemplate, WallCatalog, WallGenerationConfig,
    };
    use contracts::entities::{BuildingData, FiefdomHero, WallData};
    use contracts::ResourceBalances;

    fn fiefdom_shell() -> FiefdomData {
        FiefdomData {
            id: 1,
            owner_id: 1,
            name: "Duskmere".into(),
            x: 0,
            y: 0,
            peasants: 0,
            balances: ResourceBalances::default(),
            wall_count: 0,
            morale: 0.0,
            last_update_time: 0,
            buildings: Vec::new(),
            walls: Vec::new(),
            officials: Vec::new(),
            heroes: Vec::new(),
            stationed_combatants: Vec::new(),
        }
    }

    fn building(name: &str, level: i64) -> BuildingData {
        BuildingData {
            id: 0,
            fiefdom_id: 1,
            name: name.into(),
            level,
            x: 0,
            y: 0,
            construction_start_ts: 0,
        }
    }

    fn boosted(boost: f64, mode: MoraleEffectMode) -> BuildingTypeConfig {
        BuildingTypeConfig {
            morale_boost: Some(boost),
            morale_effect_mode: mode,
            ..Default::default()
        }
    }

    #[test]
    fn effect_modes_compose_counts_differently() {
        let mut types = std::collections::BTreeMap::new();
        types.insert("shrine".to_string(), boosted(5.0, MoraleEffectMode::Add));
        types.insert("statue".to_string(), boosted(8.0, MoraleEffectMode::Max));
        types.insert("fountain".to_string(), boosted(2.0, MoraleEffectMode::Multiply));
        let config = ConfigCache::synthetic(types);
        let aggregator = MoraleAggregator::new(&config);

        let mut fiefdom = fiefdom_shell();
        fiefdom.buildings = vec![
            building("shrine", 1),
            building("shrine", 2),
            building("statue", 1),
            building("statue", 1),
            building("fountain", 1),
            building("fountain", 1),
            building("fountain", 3),
        ];

        // shrine: 5 * 2, statue: 8 once, fountain: 2^3
        assert_eq!(aggregator.fiefdom_morale(&fiefdom), 10.0 + 8.0 + 8.0);
    }

    #[test]
    fn under_construction_buildings_do_not_count() {
        let mut types = std::collections::BTreeMap::new();
        types.insert("shrine".to_string(), boosted(5.0, MoraleEffectMode::Add));
        let config = ConfigCache::synthetic(types);
        let aggregator = MoraleAggregator::new(&config);

        let mut fiefdom = fiefdom_shell();
        fiefdom.buildings = vec![building("shrine", 0)];
        assert_eq!(aggregator.fiefdom_morale(&fiefdom), 0.0);
    }

    #[test]
    fn wall_and_hero_boosts_clamp_to_last_entry() {
        let mut walls = std::collections::BTreeMap::new();
        walls.insert(
            "1".to_string(),
            WallGenerationConfig {
                morale_boost: vec![10.0, 16.0],
                ..Default::default()
            },
        );
        let config = ConfigCache::synthetic(std::collections::BTreeMap::new())
            .with_wall_catalog(WallCatalog { walls })
            .with_hero(
                "ser_aldric",
                HeroTemplate {
                    name: "Ser Aldric".into(),
                    max_level: 10,
                    morale_boost: vec![3.0, 6.0],
                },
            );
        let aggregator = MoraleAggregator::new(&config);

        let mut fiefdom = fiefdom_shell();
        fiefdom.walls = vec![WallData {
            id: 1,
            fiefdom_id: 1,
            generation: 1,
            level: 5,
            hp: 100,
            construction_start_ts: 0,
        }];
        fiefdom.heroes = vec![FiefdomHero {
            id: 1,
            hero_config_id: "ser_aldric".into(),
            level: 9,
        }];

        assert_eq!(aggregator.fiefdom_morale(&fiefdom), 16.0 + 6.0);
    }

    #[test]
    fn score_clamps_to_bound() {
        let mut types = std::collections::BTreeMap::new();
        types.insert("shrine".to_string(), boosted(900.0, MoraleEffectMode::Add));
        let config = ConfigCache::synthetic(types);
        let aggregator = MoraleAggregator::new(&config);

        let mut fiefdom = fiefdom_shell();
        fiefdom.buildings = vec![building("shrine", 1), building("shrine", 1)];
        assert_eq!(aggregator.fiefdom_morale(&fiefdom), MORALE_BOUND);
        assert_eq!(clamp_morale(-5_000.0), -MORALE_BOUND);
    }
}

//! Elapsed-time reconciliation: completes overdue constructions, accrues
//! periodic production, refreshes morale, and bumps each fiefdom's
//! `last_update_time`, all inside one transaction per batch.

use contracts::config::extrapolate_entry;
use contracts::{
    CompletedConstruction, MoraleChange, ProductionUpdate, StockKind, TimeUpdateResult,
};
use rusqlite::Connection;
use tracing::error;

use crate::config::ConfigCache;
use crate::morale::MoraleAggregator;
use crate::store::{FetchOptions, FiefdomStore};

const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Duration of the `level -> level + 1` transition, extrapolated past the
/// catalogue's curve. Zero and negative durations never complete.
fn transition_duration(times: &[i64], level: i64) -> Option<i64> {
    extrapolate_entry(times, level.max(0) as usize).filter(|duration| *duration > 0)
}

/// Closed-form total of `full_cycles` production cycles. Straight
/// multiplication when the multiplier is 1, geometric series otherwise;
/// neither path loops over cycles.
fn production_total(amount: f64, multiplier: f64, full_cycles: i64) -> f64 {
    if (multiplier - 1.0).abs() < 1e-9 {
        amount * full_cycles as f64
    } else {
        amount * (multiplier.powi(full_cycles as i32) - 1.0) / (multiplier - 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeAdvancer<'a> {
    config: &'a ConfigCache,
}

impl<'a> TimeAdvancer<'a> {
    pub fn new(config: &'a ConfigCache) -> Self {
        Self { config }
    }

    /// Apply elapsed-time effects to every fiefdom in scope (a single id, or
    /// all of them). Each fiefdom's elapsed window starts at its own
    /// `last_update_time` when set, falling back to the caller's argument;
    /// step 4 writes `now` back, which is what makes an immediate second call
    /// a no-op. On any persistence error the whole batch rolls back and an
    /// empty report is returned.
    pub fn advance(
        &self,
        conn: &mut Connection,
        now: i64,
        last_update_time: i64,
        fiefdom_filter: Option<i64>,
    ) -> TimeUpdateResult {
        let time_hours_elapsed = (now - last_update_time) as f64 / SECONDS_PER_HOUR;

        match self.advance_in_transaction(conn, now, last_update_time, fiefdom_filter) {
            Ok(mut result) => {
                result.new_timestamp = now;
                result.time_hours_elapsed = time_hours_elapsed;
                result.production_updates_applied = result.productions.len();
                result
            }
            Err(err) => {
                error!(%err, "time advance rolled back");
                TimeUpdateResult {
                    new_timestamp: now,
                    time_hours_elapsed,
                    ..TimeUpdateResult::default()
                }
            }
        }
    }

    fn advance_in_transaction(
        &self,
        conn: &mut Connection,
        now: i64,
        last_update_time: i64,
        fiefdom_filter: Option<i64>,
    ) -> Result<TimeUpdateResult, rusqlite::Error> {
        let mut result = TimeUpdateResult::default();
        let tx = conn.transaction()?;
        let store = FiefdomStore::new(&tx);

        let scope = match fiefdom_filter {
            Some(fiefdom_id) => vec![fiefdom_id],
            None => store.fetch_all_fiefdom_ids()?,
        };

        for fiefdom_id in scope {
            let Some(mut fiefdom) = store.fetch_fiefdom_by_id(fiefdom_id, FetchOptions::all())?
            else {
                continue;
            };

            let effective_last = if fiefdom.last_update_time > 0 {
                fiefdom.last_update_time
            } else {
                last_update_time
            };
            let elapsed_hours = (now - effective_last).max(0) as f64 / SECONDS_PER_HOUR;

            for building in &mut fiefdom.buildings {
                if building.construction_start_ts <= 0 {
                    continue;
                }
                let Some(config) = self.config.building_type(&building.name) else {
                    continue;
                };
                let Some(duration) = transition_duration(&config.construction_times, building.level)
                else {
                    continue;
                };
                if now - building.construction_start_ts >= duration {
                    let new_level = building.level + 1;
                    store.update_building_level(building.id, new_level, now)?;
                    building.level = new_level;
                    building.construction_start_ts = 0;
                    result.completed_trainings.push(CompletedConstruction {
                        name: building.name.clone(),
                        level: new_level,
                    });
                }
            }

            for wall in &mut fiefdom.walls {
                if wall.construction_start_ts <= 0 {
                    continue;
                }
                let Some(generation_config) = self.config.wall_generation(wall.generation) else {
                    continue;
                };
                let Some(duration) =
                    transition_duration(&generation_config.construction_times, wall.level)
                else {
                    continue;
                };
                if now - wall.construction_start_ts >= duration {
                    let new_level = wall.level + 1;
                    let new_hp = generation_config.hp_at(new_level);
                    store.update_wall_level(wall.id, new_level, new_hp, now)?;
                    wall.level = new_level;
                    wall.hp = new_hp;
                    wall.construction_start_ts = 0;
                    result.completed_trainings.push(CompletedConstruction {
                        name: format!("wall_gen_{}", wall.generation),
                        level: new_level,
                    });
                }
            }

            let mut stock_writes: Vec<(StockKind, i64)> = Vec::new();
            for building in &fiefdom.buildings {
                if !building.is_operational() {
                    continue;
                }
                let Some(config) = self.config.building_type(&building.name) else {
                    continue;
                };
                for (kind, spec) in &config.production {
                    if spec.periodicity <= 0.0 {
                        continue;
                    }
                    let full_cycles = (elapsed_hours / spec.periodicity).floor() as i64;
                    if full_cycles <= 0 {
                        continue;
                    }
                    let total = production_total(spec.amount, spec.amount_multiplier, full_cycles);
                    let gained = total.floor() as i64;

                    if gained != 0 {
                        match kind.as_resource() {
                            Some(resource) => {
                                *fiefdom.balances.get_mut(resource) += gained;
                                stock_writes.push((*kind, fiefdom.balances.get(resource)));
                            }
                            None => {
                                fiefdom.peasants += gained;
                                stock_writes.push((StockKind::Peasants, fiefdom.peasants));
                            }
                        }
                    }
                    result.productions.push(ProductionUpdate {
                        resource_type: *kind,
                        amount_produced: total,
                        source_type: "building".to_string(),
                        source_id: building.id,
                        fiefdom_id,
                    });
                }
            }
            for (kind, value) in stock_writes {
                store.update_fiefdom_stock(fiefdom_id, kind, value)?;
            }

            let new_morale = MoraleAggregator::new(self.config).fiefdom_morale(&fiefdom);
            if (new_morale - fiefdom.morale).abs() > 1e-9 {
                store.update_fiefdom_morale(fiefdom_id, new_morale)?;
                result.morale_changes.push(MoraleChange {
                    fiefdom_id,
                    morale: new_morale,
                });
            }

            store.update_fiefdom_last_update(fiefdom_id, now)?;
            result.fiefdoms_updated += 1;
        }

        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::config::{BuildingTypeConfig, ProductionSpec};
    use contracts::ResourceBalances;
    use std::collections::BTreeMap;

    const NOW: i64 = 1_700_000_000;

    fn grain_farm() -> BuildingTypeConfig {
        let mut production = BTreeMap::new();
        production.insert(
            StockKind::Grain,
            ProductionSpec {
                amount: 10.0,
                amount_multiplier: 1.0,
                periodicity: 1.0,
                periodicity_multiplier: 1.0,
            },
        );
        BuildingTypeConfig {
            construction_times: vec![600, 1_200],
            production,
            ..Default::default()
        }
    }

    fn fixture() -> (Connection, ConfigCache, i64) {
        let conn = Connection::open_in_memory().unwrap();
        FiefdomStore::initialize_schema(&conn).unwrap();
        let store = FiefdomStore::new(&conn);
        let fiefdom_id = store
            .create_fiefdom(1, "Duskmere", 0, 0, 0, &ResourceBalances::default())
            .unwrap();

        let mut types = BTreeMap::new();
        types.insert("farm".to_string(), grain_farm());
        (conn, ConfigCache::synthetic(types), fiefdom_id)
    }

    #[test]
    fn production_total_uses_closed_forms() {
        assert_eq!(production_total(10.0, 1.0, 4), 40.0);
        // 5 * (2^3 - 1) / (2 - 1) = 35
        assert_eq!(production_total(5.0, 2.0, 3), 35.0);
    }

    #[test]
    fn overdue_construction_completes_and_clears_marker() {
        let (mut conn, config, fiefdom_id) = fixture();
        let building_id = {
            let store = FiefdomStore::new(&conn);
            store
                .create_building(fiefdom_id, "farm", 0, 3, 3, NOW - 700)
                .unwrap()
        };

        let report = TimeAdvancer::new(&config).advance(&mut conn, NOW, NOW - 700, None);
        assert_eq!(report.completed_trainings.len(), 1);
        assert_eq!(report.completed_trainings[0].level, 1);

        let store = FiefdomStore::new(&conn);
        let building = store.fetch_building(building_id).unwrap().unwrap();
        assert_eq!(building.level, 1);
        assert_eq!(building.construction_start_ts, 0);
    }

    #[test]
    fn pending_construction_stays_until_due() {
        let (mut conn, config, fiefdom_id) = fixture();
        {
            let store = FiefdomStore::new(&conn);
            store
                .create_building(fiefdom_id, "farm", 0, 3, 3, NOW - 100)
                .unwrap();
        }

        let report = TimeAdvancer::new(&config).advance(&mut conn, NOW, NOW - 100, None);
        assert!(report.completed_trainings.is_empty());
        assert_eq!(report.fiefdoms_updated, 1);
    }

    #[test]
    fn production_applies_once_per_window() {
        let (mut conn, config, fiefdom_id) = fixture();
        {
            let store = FiefdomStore::new(&conn);
            store.create_building(fiefdom_id, "farm", 1, 3, 3, 0).unwrap();
        }
        let advancer = TimeAdvancer::new(&config);

        // Four full hourly cycles.
        let first = advancer.advance(&mut conn, NOW, NOW - 4 * 3_600, None);
        assert_eq!(first.productions.len(), 1);
        assert_eq!(first.production_updates_applied, 1);
        assert_eq!(first.productions[0].amount_produced, 40.0);

        let store = FiefdomStore::new(&conn);
        let balances = store.fetch_fiefdom_resources(fiefdom_id).unwrap().unwrap();
        assert_eq!(balances.grain, 40);
    }

    #[test]
    fn second_advance_with_stale_argument_is_idempotent() {
        let (mut conn, config, fiefdom_id) = fixture();
        {
            let store = FiefdomStore::new(&conn);
            store.create_building(fiefdom_id, "farm", 1, 3, 3, 0).unwrap();
        }
        let advancer = TimeAdvancer::new(&config);
        let stale = NOW - 4 * 3_600;

        advancer.advance(&mut conn, NOW, stale, None);
        // Same stale argument again: the row's own timestamp wins.
        let second = advancer.advance(&mut conn, NOW + 10, stale, None);

        assert!(second.productions.is_empty());
        assert!(second.completed_trainings.is_empty());
        assert_eq!(second.fiefdoms_updated, 1);

        let store = FiefdomStore::new(&conn);
        let balances = store.fetch_fiefdom_resources(fiefdom_id).unwrap().unwrap();
        assert_eq!(balances.grain, 40);
    }
}

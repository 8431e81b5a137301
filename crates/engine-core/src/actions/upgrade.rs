//! The `upgrade` action for buildings and walls.
//!
//! A building upgrade is deferred: it deducts the next level's cost and
//! stamps `construction_start_ts`, leaving the level for the time advancer to
//! commit. A wall upgrade applies immediately, writing the new level and HP
//! in place.

use contracts::entities::{BuildingData, WallData};
use contracts::{ActionContext, ActionError, ActionResult};
use serde_json::Value;

use super::{
    character_owns_fiefdom, database_failure, ledger_failure, optional_i64, require_i64,
    ActionHandler, ActionWorld,
};
use crate::resources::{self, ResourceLedger};
use crate::store::FiefdomStore;

enum UpgradeTarget {
    Building(i64),
    Wall(i64),
}

struct UpgradePayload {
    fiefdom_id: i64,
    target: UpgradeTarget,
}

impl UpgradePayload {
    fn parse(payload: &Value) -> Result<Self, ActionResult> {
        let fiefdom_id = require_i64(payload, "fiefdom_id", ActionError::FiefdomIdRequired)?;
        let building_id = optional_i64(payload, "building_id");
        let wall_id = optional_i64(payload, "wall_id");
        let target = match (building_id, wall_id) {
            (Some(id), None) => UpgradeTarget::Building(id),
            (None, Some(id)) => UpgradeTarget::Wall(id),
            _ => {
                return Err(ActionResult::fail(
                    ActionError::BuildingIdRequired,
                    "exactly one of building_id or wall_id is required",
                ))
            }
        };
        Ok(Self { fiefdom_id, target })
    }
}

pub struct UpgradeHandler;

impl ActionHandler for UpgradeHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let input = match UpgradePayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        let config = world.config;
        let store = FiefdomStore::new(world.conn);

        match character_owns_fiefdom(&store, ctx, input.fiefdom_id) {
            Ok(true) => {}
            Ok(false) => {
                return ActionResult::fail(ActionError::NotOwner, "character does not own this fiefdom")
            }
            Err(err) => return database_failure(err),
        }

        match input.target {
            UpgradeTarget::Building(building_id) => {
                let building = match fetch_owned_target_building(&store, building_id, input.fiefdom_id)
                {
                    Ok(Ok(building)) => building,
                    Ok(Err(fail)) => return fail,
                    Err(err) => return database_failure(err),
                };

                if building.level == 0 {
                    return ActionResult::fail(
                        ActionError::UpgradeInProgress,
                        "building is already under construction",
                    );
                }
                if !config.is_loaded() {
                    return ActionResult::fail(
                        ActionError::InvalidConfig,
                        "configuration is unavailable",
                    );
                }
                let Some(building_config) = config.building_type(&building.name) else {
                    return ActionResult::fail(
                        ActionError::InvalidConfig,
                        "building configuration not found",
                    );
                };
                if building.level >= building_config.max_level {
                    return ActionResult::fail(
                        ActionError::MaxLevelReached,
                        "building is at maximum level",
                    );
                }

                let cost = resources::upgrade_cost(building_config, building.level);
                let ledger = ResourceLedger::new(world.conn);
                match ledger.has_enough(input.fiefdom_id, &cost) {
                    Ok(true) => {}
                    Ok(false) => {
                        return ActionResult::fail(
                            ActionError::InsufficientResources,
                            "not enough resources to upgrade",
                        )
                    }
                    Err(err) => return ledger_failure(err),
                }
            }
            UpgradeTarget::Wall(wall_id) => {
                let wall = match fetch_owned_target_wall(&store, wall_id, input.fiefdom_id) {
                    Ok(Ok(wall)) => wall,
                    Ok(Err(fail)) => return fail,
                    Err(err) => return database_failure(err),
                };

                if wall.level == 0 {
                    return ActionResult::fail(
                        ActionError::UpgradeInProgress,
                        "wall is already under construction",
                    );
                }
                if !config.is_loaded() {
                    return ActionResult::fail(
                        ActionError::InvalidConfig,
                        "configuration is unavailable",
                    );
                }
                let Some(generation_config) = config.wall_generation(wall.generation) else {
                    return ActionResult::fail(
                        ActionError::InvalidConfig,
                        "wall configuration not found",
                    );
                };
                if wall.level >= generation_config.max_level() {
                    return ActionResult::fail(
                        ActionError::MaxLevelReached,
                        "wall is at maximum level",
                    );
                }

                let cost = resources::wall_level_cost(generation_config, wall.level + 1);
                let ledger = ResourceLedger::new(world.conn);
                match ledger.has_enough(input.fiefdom_id, &cost) {
                    Ok(true) => {}
                    Ok(false) => {
                        return ActionResult::fail(
                            ActionError::InsufficientResources,
                            "not enough resources to upgrade",
                        )
                    }
                    Err(err) => return ledger_failure(err),
                }
            }
        }

        ActionResult::ok()
    }

    fn execute(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let validated = self.validate(world, payload, ctx);
        if !validated.is_ok() {
            return validated;
        }
        let input = match UpgradePayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        match upgrade_in_transaction(world, &input) {
            Ok(result) => result,
            Err(err) => database_failure(err),
        }
    }

    fn description(&self) -> &'static str {
        "Upgrade buildings and walls"
    }
}

fn fetch_owned_target_building(
    store: &FiefdomStore<'_>,
    building_id: i64,
    fiefdom_id: i64,
) -> rusqlite::Result<Result<BuildingData, ActionResult>> {
    let Some(building) = store.fetch_building(building_id)? else {
        return Ok(Err(ActionResult::fail(
            ActionError::NotOwner,
            "character does not own this building",
        )));
    };
    if building.fiefdom_id != fiefdom_id {
        return Ok(Err(ActionResult::fail(
            ActionError::NotOwner,
            "building belongs to a different fiefdom",
        )));
    }
    Ok(Ok(building))
}

fn fetch_owned_target_wall(
    store: &FiefdomStore<'_>,
    wall_id: i64,
    fiefdom_id: i64,
) -> rusqlite::Result<Result<WallData, ActionResult>> {
    let Some(wall) = store.fetch_wall(wall_id)? else {
        return Ok(Err(ActionResult::fail(
            ActionError::NotOwner,
            "character does not own this wall",
        )));
    };
    if wall.fiefdom_id != fiefdom_id {
        return Ok(Err(ActionResult::fail(
            ActionError::NotOwner,
            "wall belongs to a different fiefdom",
        )));
    }
    Ok(Ok(wall))
}

fn upgrade_in_transaction(
    world: &mut ActionWorld<'_>,
    input: &UpgradePayload,
) -> Result<ActionResult, rusqlite::Error> {
    let now = world.now;
    let config = world.config;
    let tx = world.conn.transaction()?;
    let store = FiefdomStore::new(&tx);
    let ledger = ResourceLedger::new(&tx);
    let mut result = ActionResult::ok();

    match input.target {
        UpgradeTarget::Building(building_id) => {
            let Some(building) = store.fetch_building(building_id)? else {
                return Ok(ActionResult::fail(
                    ActionError::NotOwner,
                    "character does not own this building",
                ));
            };
            let Some(building_config) = config.building_type(&building.name) else {
                return Ok(ActionResult::fail(
                    ActionError::InvalidConfig,
                    "building configuration not found",
                ));
            };

            let cost = resources::upgrade_cost(building_config, building.level);
            if let Err(err) = ledger.deduct(input.fiefdom_id, &cost, &mut result) {
                return Ok(ledger_failure(err));
            }
            // The level stays put; the time advancer commits the transition
            // once construction_times[level] has elapsed.
            store.update_building_construction_start(building_id, now, now)?;

            result.insert("building_id", building_id);
            result.insert("upgrade_to_level", building.level + 1);
            result.insert("cost", serde_json::to_value(&cost).unwrap_or(Value::Null));
        }
        UpgradeTarget::Wall(wall_id) => {
            let Some(wall) = store.fetch_wall(wall_id)? else {
                return Ok(ActionResult::fail(
                    ActionError::NotOwner,
                    "character does not own this wall",
                ));
            };
            let Some(generation_config) = config.wall_generation(wall.generation) else {
                return Ok(ActionResult::fail(
                    ActionError::InvalidConfig,
                    "wall configuration not found",
                ));
            };

            let cost = resources::wall_level_cost(generation_config, wall.level + 1);
            if let Err(err) = ledger.deduct(input.fiefdom_id, &cost, &mut result) {
                return Ok(ledger_failure(err));
            }
            let new_hp = generation_config.hp_at(wall.level + 1);
            store.update_wall_level(wall_id, wall.level + 1, new_hp, now)?;

            result.insert("wall_id", wall_id);
            result.insert("upgrade_to_level", wall.level + 1);
            result.insert("new_hp", new_hp);
            result.insert("cost", serde_json::to_value(&cost).unwrap_or(Value::Null));
        }
    }

    result.action_timestamp = now;
    tx.commit()?;
    Ok(result)
}

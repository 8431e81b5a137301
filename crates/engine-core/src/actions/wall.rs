//! The `build_wall` action: raise a new perimeter generation, cascade-
//! demolishing any operational building standing on the ring.

use contracts::{ActionContext, ActionError, ActionResult};
use serde_json::{json, Value};

use super::{
    character_owns_fiefdom, database_failure, ledger_failure, require_i64, ActionHandler,
    ActionWorld,
};
use crate::resources::{self, ResourceLedger};
use crate::spatial::SpatialChecker;
use crate::store::FiefdomStore;

struct BuildWallPayload {
    fiefdom_id: i64,
    wall_generation: i64,
}

impl BuildWallPayload {
    fn parse(payload: &Value) -> Result<Self, ActionResult> {
        let fiefdom_id = require_i64(payload, "fiefdom_id", ActionError::FiefdomIdRequired)?;
        let wall_generation =
            require_i64(payload, "wall_generation", ActionError::WallGenerationRequired)?;
        Ok(Self {
            fiefdom_id,
            wall_generation,
        })
    }
}

pub struct BuildWallHandler;

impl ActionHandler for BuildWallHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let input = match BuildWallPayload::parse(payload) {
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

        if !config.is_loaded() {
            return ActionResult::fail(ActionError::InvalidConfig, "configuration is unavailable");
        }
        let Some(generation_config) = config.wall_generation(input.wall_generation) else {
            return ActionResult::fail(
                ActionError::MissingWallConfig,
                format!("no wall configuration for generation {}", input.wall_generation),
            );
        };
        if !SpatialChecker::wall_fits_world(generation_config) {
            return ActionResult::fail(
                ActionError::InvalidWallPlacement,
                "wall perimeter does not fit inside the world envelope",
            );
        }

        if input.wall_generation > 1 {
            match store.wall_generation_exists(input.fiefdom_id, input.wall_generation - 1) {
                Ok(true) => {}
                Ok(false) => {
                    return ActionResult::fail(
                        ActionError::GenerationSequenceRequired,
                        format!(
                            "wall generation {} must be built first",
                            input.wall_generation - 1
                        ),
                    )
                }
                Err(err) => return database_failure(err),
            }
        }
        match store.wall_generation_exists(input.fiefdom_id, input.wall_generation) {
            Ok(false) => {}
            Ok(true) => {
                return ActionResult::fail(
                    ActionError::GenerationExists,
                    format!("wall generation {} already exists", input.wall_generation),
                )
            }
            Err(err) => return database_failure(err),
        }

        let cost = resources::wall_level_cost(generation_config, 1);
        let ledger = ResourceLedger::new(world.conn);
        match ledger.has_enough(input.fiefdom_id, &cost) {
            Ok(true) => {}
            Ok(false) => {
                return ActionResult::fail(
                    ActionError::InsufficientResources,
                    "not enough resources to build wall",
                )
            }
            Err(err) => return ledger_failure(err),
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
        let input = match BuildWallPayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        match build_wall_in_transaction(world, &input) {
            Ok(result) => result,
            Err(err) => database_failure(err),
        }
    }

    fn description(&self) -> &'static str {
        "Raise a wall generation around the fiefdom"
    }
}

fn build_wall_in_transaction(
    world: &mut ActionWorld<'_>,
    input: &BuildWallPayload,
) -> Result<ActionResult, rusqlite::Error> {
    let now = world.now;
    let config = world.config;
    let Some(generation_config) = config.wall_generation(input.wall_generation) else {
        return Ok(ActionResult::fail(
            ActionError::MissingWallConfig,
            "wall configuration not found",
        ));
    };

    let tx = world.conn.transaction()?;
    let store = FiefdomStore::new(&tx);
    let ledger = ResourceLedger::new(&tx);
    let checker = SpatialChecker::new(config);
    let mut result = ActionResult::ok();

    let cost = resources::wall_level_cost(generation_config, 1);
    if let Err(err) = ledger.deduct(input.fiefdom_id, &cost, &mut result) {
        return Ok(ledger_failure(err));
    }

    // Any operational building standing on the new ring is expropriated:
    // refunded at the demolition rate and removed.
    let in_the_way =
        checker.overlapping_operational_buildings(&store, input.fiefdom_id, generation_config)?;
    let mut demolished = Vec::with_capacity(in_the_way.len());
    for building in in_the_way {
        let refund = config
            .building_type(&building.name)
            .map(|building_config| resources::demolish_refund(building_config, building.level))
            .unwrap_or_default();
        if let Err(err) = ledger.refund(input.fiefdom_id, &refund, &mut result) {
            return Ok(ledger_failure(err));
        }
        store.delete_building(building.id)?;
        demolished.push(json!({
            "building_id": building.id,
            "building_type": building.name,
            "refund": refund,
        }));
    }

    let hp = generation_config.hp_at(1);
    let wall_id = store.create_wall(input.fiefdom_id, input.wall_generation, 1, hp, now)?;
    let wall_total = store.fetch_fiefdom_walls(input.fiefdom_id)?.len() as i64;
    store.update_fiefdom_wall_count(input.fiefdom_id, wall_total)?;

    result.insert("wall_id", wall_id);
    result.insert("generation", input.wall_generation);
    result.insert("level", 1);
    result.insert("hp", hp);
    result.insert("width", generation_config.width);
    result.insert("length", generation_config.length);
    result.insert("thickness", generation_config.thickness);
    result.insert("cost", serde_json::to_value(&cost).unwrap_or(Value::Null));
    result.insert("demolished_buildings", Value::Array(demolished));
    result.action_timestamp = now;

    tx.commit()?;
    Ok(result)
}

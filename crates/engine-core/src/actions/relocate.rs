//! The `move` action: reposition an operational building for a tenth of its
//! current level's cost. The spatial check excludes the building itself so it
//! never collides with its own old footprint.

use contracts::{ActionContext, ActionError, ActionResult, HOME_BASE};
use serde_json::Value;

use super::{
    database_failure, ledger_failure, owned_building, placement_failure, require_coordinates,
    require_i64, ActionHandler, ActionWorld,
};
use crate::resources::{self, ResourceLedger};
use crate::spatial::SpatialChecker;
use crate::store::FiefdomStore;

struct MovePayload {
    building_id: i64,
    x: i64,
    y: i64,
}

impl MovePayload {
    fn parse(payload: &Value) -> Result<Self, ActionResult> {
        let building_id = require_i64(payload, "building_id", ActionError::BuildingIdRequired)?;
        let (x, y) = require_coordinates(payload)?;
        Ok(Self { building_id, x, y })
    }
}

pub struct MoveBuildingHandler;

impl ActionHandler for MoveBuildingHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let input = match MovePayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        let config = world.config;
        let store = FiefdomStore::new(world.conn);

        let building = match owned_building(&store, ctx, input.building_id) {
            Ok(Some(building)) => building,
            Ok(None) => {
                return ActionResult::fail(ActionError::NotOwner, "character does not own this building")
            }
            Err(err) => return database_failure(err),
        };

        if building.name == HOME_BASE {
            return ActionResult::fail(
                ActionError::HomeBaseImmutable,
                "the home_base cannot be moved",
            );
        }
        if building.level <= 0 {
            return ActionResult::fail(
                ActionError::CannotMoveUnderConstruction,
                "cannot move a building under construction",
            );
        }

        let checker = SpatialChecker::new(config);
        let check = match checker.check_placement(
            &store,
            building.fiefdom_id,
            &building.name,
            input.x,
            input.y,
            false,
            Some(building.id),
        ) {
            Ok(check) => check,
            Err(err) => return database_failure(err),
        };
        if !check.valid {
            return placement_failure(check);
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
        let input = match MovePayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        match move_in_transaction(world, &input) {
            Ok(result) => result,
            Err(err) => database_failure(err),
        }
    }

    fn description(&self) -> &'static str {
        "Move a building (10% of current level cost)"
    }
}

fn move_in_transaction(
    world: &mut ActionWorld<'_>,
    input: &MovePayload,
) -> Result<ActionResult, rusqlite::Error> {
    let now = world.now;
    let config = world.config;
    let tx = world.conn.transaction()?;
    let store = FiefdomStore::new(&tx);

    let Some(building) = store.fetch_building(input.building_id)? else {
        return Ok(ActionResult::fail(
            ActionError::NotOwner,
            "character does not own this building",
        ));
    };

    let cost = config
        .building_type(&building.name)
        .map(|building_config| resources::move_cost(building_config, building.level))
        .unwrap_or_default();

    let mut result = ActionResult::ok();
    let ledger = ResourceLedger::new(&tx);
    if let Err(err) = ledger.deduct(building.fiefdom_id, &cost, &mut result) {
        return Ok(ledger_failure(err));
    }
    store.update_building_position(input.building_id, input.x, input.y)?;

    result.insert("building_id", input.building_id);
    result.insert("new_x", input.x);
    result.insert("new_y", input.y);
    result.insert("cost", serde_json::to_value(&cost).unwrap_or(Value::Null));
    result.action_timestamp = now;

    tx.commit()?;
    Ok(result)
}

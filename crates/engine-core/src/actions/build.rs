//! The `build` action: place a new building at level 0 and start its
//! construction clock.

use contracts::{ActionContext, ActionError, ActionResult, HOME_BASE};
use serde_json::Value;

use super::{
    character_owns_fiefdom, database_failure, ledger_failure, placement_failure,
    require_coordinates, require_i64, require_str, ActionHandler, ActionWorld,
};
use crate::resources::{self, ResourceLedger};
use crate::spatial::SpatialChecker;
use crate::store::FiefdomStore;

struct BuildPayload {
    fiefdom_id: i64,
    building_type: String,
    x: i64,
    y: i64,
}

impl BuildPayload {
    fn parse(payload: &Value) -> Result<Self, ActionResult> {
        let fiefdom_id = require_i64(payload, "fiefdom_id", ActionError::FiefdomIdRequired)?;
        let building_type =
            require_str(payload, "building_type", ActionError::BuildingTypeRequired)?.to_string();
        let (x, y) = require_coordinates(payload)?;
        Ok(Self {
            fiefdom_id,
            building_type,
            x,
            y,
        })
    }
}

pub struct BuildHandler;

impl ActionHandler for BuildHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let input = match BuildPayload::parse(payload) {
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
        let Some(building_config) = config.building_type(&input.building_type) else {
            return ActionResult::fail(
                ActionError::UnknownBuilding,
                format!("unknown building type: {}", input.building_type),
            );
        };
        let display_name = building_config
            .display_name
            .as_deref()
            .unwrap_or(&input.building_type);

        let has_home_base = match store.has_completed_home_base(input.fiefdom_id) {
            Ok(has) => has,
            Err(err) => return database_failure(err),
        };
        if input.building_type == HOME_BASE {
            if has_home_base {
                return ActionResult::fail(
                    ActionError::HomeBaseExists,
                    format!("a {display_name} (home_base) already exists"),
                );
            }
        } else if !has_home_base {
            return ActionResult::fail(
                ActionError::HomeBaseRequired,
                "a completed home_base is required before other buildings",
            );
        }

        let checker = SpatialChecker::new(config);
        let check = match checker.check_placement(
            &store,
            input.fiefdom_id,
            &input.building_type,
            input.x,
            input.y,
            true,
            None,
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
        let input = match BuildPayload::parse(payload) {
            Ok(input) => input,
            Err(fail) => return fail,
        };
        match build_in_transaction(world, &input) {
            Ok(result) => result,
            Err(err) => database_failure(err),
        }
    }

    fn description(&self) -> &'static str {
        "Build structures"
    }
}

fn build_in_transaction(
    world: &mut ActionWorld<'_>,
    input: &BuildPayload,
) -> Result<ActionResult, rusqlite::Error> {
    let now = world.now;
    let Some(building_config) = world.config.building_type(&input.building_type) else {
        return Ok(ActionResult::fail(
            ActionError::InvalidConfig,
            "building configuration not found",
        ));
    };
    // Level 0 costs are the first entry of each cost curve.
    let costs = resources::upgrade_cost(building_config, 0);

    let tx = world.conn.transaction()?;
    let mut result = ActionResult::ok();

    let ledger = ResourceLedger::new(&tx);
    if let Err(err) = ledger.deduct(input.fiefdom_id, &costs, &mut result) {
        return Ok(ledger_failure(err));
    }

    let store = FiefdomStore::new(&tx);
    let building_id =
        store.create_building(input.fiefdom_id, &input.building_type, 0, input.x, input.y, now)?;

    result.insert("building_id", building_id);
    result.insert("building_type", input.building_type.clone());
    result.insert("fiefdom_id", input.fiefdom_id);
    result.insert("x", input.x);
    result.insert("y", input.y);
    result.insert("construction_start_ts", now);
    result.insert("level", 0);
    result.action_timestamp = now;

    tx.commit()?;
    Ok(result)
}

//! The `demolish` action: remove a building and refund 80% of its cumulative
//! cost.

use contracts::{ActionContext, ActionError, ActionResult, HOME_BASE};
use serde_json::Value;

use super::{
    database_failure, ledger_failure, owned_building, require_i64, ActionHandler, ActionWorld,
};
use crate::resources::{self, ResourceLedger};
use crate::store::FiefdomStore;

pub struct DemolishHandler;

impl ActionHandler for DemolishHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let building_id = match require_i64(payload, "building_id", ActionError::BuildingIdRequired)
        {
            Ok(id) => id,
            Err(fail) => return fail,
        };

        let store = FiefdomStore::new(world.conn);
        let building = match owned_building(&store, ctx, building_id) {
            Ok(Some(building)) => building,
            Ok(None) => {
                return ActionResult::fail(ActionError::NotOwner, "character does not own this building")
            }
            Err(err) => return database_failure(err),
        };

        if building.name == HOME_BASE {
            return ActionResult::fail(
                ActionError::HomeBaseImmutable,
                "the home_base cannot be demolished",
            );
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
        let building_id = match require_i64(payload, "building_id", ActionError::BuildingIdRequired)
        {
            Ok(id) => id,
            Err(fail) => return fail,
        };
        match demolish_in_transaction(world, building_id) {
            Ok(result) => result,
            Err(err) => database_failure(err),
        }
    }

    fn description(&self) -> &'static str {
        "Demolish a building (80% refund of cumulative costs)"
    }
}

fn demolish_in_transaction(
    world: &mut ActionWorld<'_>,
    building_id: i64,
) -> Result<ActionResult, rusqlite::Error> {
    let now = world.now;
    let config = world.config;
    let tx = world.conn.transaction()?;
    let store = FiefdomStore::new(&tx);

    let Some(building) = store.fetch_building(building_id)? else {
        return Ok(ActionResult::fail(
            ActionError::NotOwner,
            "character does not own this building",
        ));
    };

    // A building whose type has left the catalogue still demolishes; it just
    // refunds nothing.
    let refund = config
        .building_type(&building.name)
        .map(|building_config| resources::demolish_refund(building_config, building.level))
        .unwrap_or_default();

    let mut result = ActionResult::ok();
    let ledger = ResourceLedger::new(&tx);
    if let Err(err) = ledger.refund(building.fiefdom_id, &refund, &mut result) {
        return Ok(ledger_failure(err));
    }
    store.delete_building(building_id)?;

    result.insert("building_id", building_id);
    result.insert(
        "refund",
        serde_json::to_value(&refund).unwrap_or(Value::Null),
    );
    result.action_timestamp = now;

    tx.commit()?;
    Ok(result)
}

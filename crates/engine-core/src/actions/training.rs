//! Reserved action tags: troop training and the two research branches.
//! They validate ownership so the dispatch surface stays stable, and refuse
//! to execute until the systems behind them land.

use contracts::{ActionContext, ActionError, ActionResult};
use serde_json::Value;

use super::{
    character_owns_fiefdom, database_failure, require_i64, ActionHandler, ActionWorld,
};
use crate::store::FiefdomStore;

pub struct PlannedActionHandler {
    description: &'static str,
}

impl PlannedActionHandler {
    pub fn new(description: &'static str) -> Self {
        Self { description }
    }
}

impl ActionHandler for PlannedActionHandler {
    fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let fiefdom_id = match require_i64(payload, "fiefdom_id", ActionError::FiefdomIdRequired) {
            Ok(id) => id,
            Err(fail) => return fail,
        };
        let store = FiefdomStore::new(world.conn);
        match character_owns_fiefdom(&store, ctx, fiefdom_id) {
            Ok(true) => ActionResult::ok(),
            Ok(false) => {
                ActionResult::fail(ActionError::NotOwner, "character does not own this fiefdom")
            }
            Err(err) => database_failure(err),
        }
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
        ActionResult::fail(ActionError::NotImplemented, "this action is not yet available")
    }

    fn description(&self) -> &'static str {
        self.description
    }
}

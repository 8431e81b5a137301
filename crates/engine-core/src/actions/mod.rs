//! The validate/execute action pipeline: tag dispatch, payload extraction,
//! and the handlers behind every player action.

mod build;
mod demolish;
mod relocate;
mod training;
mod upgrade;
mod wall;

use std::collections::BTreeMap;

use contracts::entities::BuildingData;
use contracts::{ActionContext, ActionError, ActionResult};
use rusqlite::Connection;
use serde_json::Value;

use crate::config::ConfigCache;
use crate::resources::LedgerError;
use crate::store::FiefdomStore;

pub use build::BuildHandler;
pub use demolish::DemolishHandler;
pub use relocate::MoveBuildingHandler;
pub use training::PlannedActionHandler;
pub use upgrade::UpgradeHandler;
pub use wall::BuildWallHandler;

/// Everything a handler may touch: the database connection and the catalogue
/// cache, plus the timestamp the engine stamped onto this invocation.
pub struct ActionWorld<'a> {
    pub conn: &'a mut Connection,
    pub config: &'a ConfigCache,
    pub now: i64,
}

/// One registered action. `execute` must re-run `validate` before mutating:
/// the engine never assumes validate was the most recent call.
pub trait ActionHandler: Send + Sync {
    fn validate(&self, world: &mut ActionWorld<'_>, payload: &Value, ctx: &ActionContext)
        -> ActionResult;
    fn execute(&self, world: &mut ActionWorld<'_>, payload: &Value, ctx: &ActionContext)
        -> ActionResult;
    fn description(&self) -> &'static str;
}

/// Tag -> handler dispatch table. Populated once at engine construction and
/// read-only afterwards.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: BTreeMap<String, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full action surface: the five building/wall actions plus the
    /// reserved training and research tags.
    pub fn with_default_actions() -> Self {
        let mut registry = Self::new();
        registry.register("build", Box::new(BuildHandler));
        registry.register("demolish", Box::new(DemolishHandler));
        registry.register("move", Box::new(MoveBuildingHandler));
        registry.register("upgrade", Box::new(UpgradeHandler));
        registry.register("build_wall", Box::new(BuildWallHandler));
        registry.register(
            "train_troops",
            Box::new(PlannedActionHandler::new("Train combatants")),
        );
        registry.register(
            "research_magic",
            Box::new(PlannedActionHandler::new("Research magic")),
        );
        registry.register(
            "research_tech",
            Box::new(PlannedActionHandler::new("Research technology")),
        );
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(tag.into(), handler);
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn registered_tags(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn description(&self, tag: &str) -> Option<&str> {
        self.handlers.get(tag).map(|handler| handler.description())
    }

    pub fn validate(
        &self,
        world: &mut ActionWorld<'_>,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        match self.handlers.get(tag) {
            Some(handler) => handler.validate(world, payload, ctx),
            None => unknown_action(tag),
        }
    }

    pub fn execute(
        &self,
        world: &mut ActionWorld<'_>,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        match self.handlers.get(tag) {
            Some(handler) => handler.execute(world, payload, ctx),
            None => unknown_action(tag),
        }
    }

    /// Run validate; on OK run execute, otherwise return the validate result.
    pub fn validate_and_execute(
        &self,
        world: &mut ActionWorld<'_>,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
    ) -> ActionResult {
        let validated = self.validate(world, tag, payload, ctx);
        if !validated.is_ok() {
            return validated;
        }
        self.execute(world, tag, payload, ctx)
    }
}

fn unknown_action(tag: &str) -> ActionResult {
    ActionResult::fail(ActionError::UnknownAction, format!("unknown action type: {tag}"))
}

// ---------------------------------------------------------------------------
// Payload extraction
// ---------------------------------------------------------------------------

pub(crate) fn require_i64(
    payload: &Value,
    key: &str,
    missing: ActionError,
) -> Result<i64, ActionResult> {
    payload
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ActionResult::fail(missing, format!("{key} is required")))
}

pub(crate) fn require_str<'p>(
    payload: &'p Value,
    key: &str,
    missing: ActionError,
) -> Result<&'p str, ActionResult> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ActionResult::fail(missing, format!("{key} is required")))
}

pub(crate) fn require_coordinates(payload: &Value) -> Result<(i64, i64), ActionResult> {
    let x = payload.get("x").and_then(Value::as_i64);
    let y = payload.get("y").and_then(Value::as_i64);
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ActionResult::fail(
            ActionError::CoordinatesRequired,
            "x and y coordinates are required",
        )),
    }
}

pub(crate) fn optional_i64(payload: &Value, key: &str) -> Option<i64> {
    payload.get(key).and_then(Value::as_i64)
}

// ---------------------------------------------------------------------------
// Ownership and failure mapping
// ---------------------------------------------------------------------------

pub(crate) fn character_owns_fiefdom(
    store: &FiefdomStore<'_>,
    ctx: &ActionContext,
    fiefdom_id: i64,
) -> rusqlite::Result<bool> {
    Ok(store.fiefdom_owner(fiefdom_id)? == Some(ctx.requesting_character_id))
}

/// Fetch a building and verify the requesting character owns its fiefdom.
/// A missing building reads as not-owned, like a row the caller cannot see.
pub(crate) fn owned_building(
    store: &FiefdomStore<'_>,
    ctx: &ActionContext,
    building_id: i64,
) -> rusqlite::Result<Option<BuildingData>> {
    let Some(building) = store.fetch_building(building_id)? else {
        return Ok(None);
    };
    if character_owns_fiefdom(store, ctx, building.fiefdom_id)? {
        Ok(Some(building))
    } else {
        Ok(None)
    }
}

/// Map a spatial rejection onto the stable error surface, carrying the
/// colliding ids so clients can highlight them.
pub(crate) fn placement_failure(check: crate::spatial::PlacementCheck) -> ActionResult {
    use crate::spatial::PlacementError;
    let code = match check.error {
        Some(PlacementError::OutOfRange) => ActionError::OutOfRange,
        Some(PlacementError::HomeBaseOrigin) => ActionError::HomeBaseOrigin,
        _ => ActionError::InvalidLocation,
    };
    let message = if check.message.is_empty() {
        "cannot build at the specified location".to_string()
    } else {
        check.message
    };
    let mut result = ActionResult::fail(code, message);
    if !check.overlapping_building_ids.is_empty() {
        result.insert(
            "overlapping_building_ids",
            serde_json::json!(check.overlapping_building_ids),
        );
    }
    result
}

pub(crate) fn database_failure(err: rusqlite::Error) -> ActionResult {
    ActionResult::fail(ActionError::DatabaseError, err.to_string())
}

pub(crate) fn ledger_failure(err: LedgerError) -> ActionResult {
    match err {
        LedgerError::Insufficient(resource) => ActionResult::fail(
            ActionError::InsufficientResources,
            format!("not enough {resource}"),
        ),
        other => ActionResult::fail(ActionError::DatabaseError, other.to_string()),
    }
}

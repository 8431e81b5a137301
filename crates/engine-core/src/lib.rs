//! The fiefdom game action engine: a pluggable validate/execute pipeline that
//! turns an authenticated request plus a JSON payload into a transactional,
//! diff-producing mutation of the persistent game state.
//!
//! Transport, authentication, and schema ownership for the account tables
//! live with the embedding service; the engine exposes a value-in/value-out
//! contract and never throws across it.

pub mod actions;
pub mod advance;
pub mod config;
pub mod morale;
pub mod resources;
pub mod spatial;
pub mod store;

use std::fmt;
use std::path::Path;

use contracts::{ActionContext, ActionResult, TimeUpdateResult};
use rusqlite::Connection;
use serde_json::Value;

pub use actions::{ActionHandler, ActionRegistry, ActionWorld};
pub use advance::TimeAdvancer;
pub use config::ConfigCache;
pub use morale::MoraleAggregator;
pub use spatial::SpatialChecker;
pub use store::{FetchOptions, FiefdomStore};

/// Seconds since the Unix epoch.
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Debug)]
pub enum EngineError {
    Database(rusqlite::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(err) => write!(f, "engine database error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<rusqlite::Error> for EngineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Database(value)
    }
}

/// Owns the database handle, the catalogue cache, and the action registry.
/// One engine serves many sequential requests; concurrent engines on the same
/// database serialise through the store's row locks.
pub struct Engine {
    conn: Connection,
    config: ConfigCache,
    registry: ActionRegistry,
}

impl Engine {
    /// Open (or create) the game database and load the catalogue directory.
    pub fn open(
        db_path: impl AsRef<Path>,
        config_dir: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn, ConfigCache::load(config_dir))
    }

    /// An engine over in-memory storage; used by tests and ephemeral tooling.
    pub fn in_memory(config: ConfigCache) -> Result<Self, EngineError> {
        Self::with_connection(Connection::open_in_memory()?, config)
    }

    pub fn with_connection(conn: Connection, config: ConfigCache) -> Result<Self, EngineError> {
        FiefdomStore::initialize_schema(&conn)?;
        Ok(Self {
            conn,
            config,
            registry: ActionRegistry::with_default_actions(),
        })
    }

    pub fn config(&self) -> &ConfigCache {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Register a custom action before serving requests.
    pub fn register_action(&mut self, tag: impl Into<String>, handler: Box<dyn ActionHandler>) {
        self.registry.register(tag, handler);
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Read-only typed access to the persisted entities.
    pub fn store(&self) -> FiefdomStore<'_> {
        FiefdomStore::new(&self.conn)
    }

    pub fn validate(&mut self, tag: &str, payload: &Value, ctx: &ActionContext) -> ActionResult {
        self.validate_at(tag, payload, ctx, current_timestamp())
    }

    pub fn validate_at(
        &mut self,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
        now: i64,
    ) -> ActionResult {
        let mut world = ActionWorld {
            conn: &mut self.conn,
            config: &self.config,
            now,
        };
        self.registry.validate(&mut world, tag, payload, ctx)
    }

    pub fn execute(&mut self, tag: &str, payload: &Value, ctx: &ActionContext) -> ActionResult {
        self.execute_at(tag, payload, ctx, current_timestamp())
    }

    pub fn execute_at(
        &mut self,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
        now: i64,
    ) -> ActionResult {
        let mut world = ActionWorld {
            conn: &mut self.conn,
            config: &self.config,
            now,
        };
        self.registry.execute(&mut world, tag, payload, ctx)
    }

    /// The single logical entry point: validate, and on OK, execute.
    pub fn dispatch(&mut self, tag: &str, payload: &Value, ctx: &ActionContext) -> ActionResult {
        self.dispatch_at(tag, payload, ctx, current_timestamp())
    }

    pub fn dispatch_at(
        &mut self,
        tag: &str,
        payload: &Value,
        ctx: &ActionContext,
        now: i64,
    ) -> ActionResult {
        let mut world = ActionWorld {
            conn: &mut self.conn,
            config: &self.config,
            now,
        };
        self.registry.validate_and_execute(&mut world, tag, payload, ctx)
    }

    /// Reconcile elapsed time for one fiefdom or all of them.
    pub fn advance(
        &mut self,
        last_update_time: i64,
        fiefdom_filter: Option<i64>,
    ) -> TimeUpdateResult {
        self.advance_at(current_timestamp(), last_update_time, fiefdom_filter)
    }

    pub fn advance_at(
        &mut self,
        now: i64,
        last_update_time: i64,
        fiefdom_filter: Option<i64>,
    ) -> TimeUpdateResult {
        TimeAdvancer::new(&self.config).advance(&mut self.conn, now, last_update_time, fiefdom_filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::config::BuildingTypeConfig;
    use contracts::{ActionError, ResourceBalances};
    use serde_json::json;
    use std::collections::BTreeMap;

    const NOW: i64 = 1_700_000_000;

    fn engine_fixture() -> (Engine, i64) {
        let mut types = BTreeMap::new();
        types.insert(
            "home_base".to_string(),
            BuildingTypeConfig {
                max_level: 3,
                width: 4,
                height: 4,
                gold_cost: vec![100, 400, 900],
                construction_times: vec![600, 1_800, 5_400],
                ..Default::default()
            },
        );
        let mut engine = Engine::in_memory(ConfigCache::synthetic(types)).unwrap();
        let fiefdom_id = engine
            .store()
            .create_fiefdom(
                1,
                "Duskmere",
                0,
                0,
                0,
                &ResourceBalances {
                    gold: 10_000,
                    ..Default::default()
                },
            )
            .unwrap();
        (engine, fiefdom_id)
    }

    #[test]
    fn dispatch_runs_validate_then_execute() {
        let (mut engine, fiefdom_id) = engine_fixture();
        let ctx = ActionContext::new(1, fiefdom_id);

        let result = engine.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "home_base", "x": 0, "y": 0}),
            &ctx,
            NOW,
        );
        assert!(result.is_ok(), "unexpected failure: {:?}", result.error_code);
        assert_eq!(result.result["level"], 0);
        assert_eq!(result.action_timestamp, NOW);

        let buildings = engine.store().fetch_fiefdom_buildings(fiefdom_id).unwrap();
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].construction_start_ts, NOW);
    }

    #[test]
    fn dispatch_surfaces_validate_failure_without_mutation() {
        let (mut engine, fiefdom_id) = engine_fixture();
        let ctx = ActionContext::new(2, fiefdom_id);

        let result = engine.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "home_base", "x": 0, "y": 0}),
            &ctx,
            NOW,
        );
        assert_eq!(result.error_code, Some(ActionError::NotOwner));
        assert!(engine
            .store()
            .fetch_fiefdom_buildings(fiefdom_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unknown_tag_is_a_stable_failure() {
        let (mut engine, fiefdom_id) = engine_fixture();
        let ctx = ActionContext::new(1, fiefdom_id);
        let result = engine.dispatch_at("summon_storm", &json!({}), &ctx, NOW);
        assert_eq!(result.error_code, Some(ActionError::UnknownAction));
    }
}

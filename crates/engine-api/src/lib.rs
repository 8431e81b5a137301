//! In-process facade over the action engine: opens storage and catalogues,
//! refreshes elapsed time before state-dependent requests, and dispatches
//! actions. Transport and authentication belong to the embedding service.

use std::path::Path;

use contracts::entities::FiefdomData;
use contracts::{ActionContext, ActionResult, TimeUpdateResult};
use engine_core::{current_timestamp, ConfigCache, Engine, EngineError, FetchOptions};
use serde_json::Value;

pub struct EngineApi {
    engine: Engine,
}

impl EngineApi {
    pub fn open(
        db_path: impl AsRef<Path>,
        config_dir: impl AsRef<Path>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            engine: Engine::open(db_path, config_dir)?,
        })
    }

    pub fn in_memory(config: ConfigCache) -> Result<Self, EngineError> {
        Ok(Self {
            engine: Engine::in_memory(config)?,
        })
    }

    pub fn engine(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Dispatch an action on behalf of an authenticated request. The
    /// requesting fiefdom is brought up to date first so validation sees
    /// completed constructions and accrued production.
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
        if ctx.requesting_fiefdom_id > 0 {
            self.engine
                .advance_at(now, now, Some(ctx.requesting_fiefdom_id));
        }
        self.engine.dispatch_at(tag, payload, ctx, now)
    }

    /// Reconcile elapsed time for one fiefdom or the whole world.
    pub fn advance_time(
        &mut self,
        last_update_time: i64,
        fiefdom_filter: Option<i64>,
    ) -> TimeUpdateResult {
        self.engine.advance(last_update_time, fiefdom_filter)
    }

    /// Fully hydrated fiefdom snapshot, refreshed before the read.
    pub fn fetch_fiefdom(&mut self, fiefdom_id: i64) -> Result<Option<FiefdomData>, EngineError> {
        let now = current_timestamp();
        self.engine.advance_at(now, now, Some(fiefdom_id));
        Ok(self
            .engine
            .store()
            .fetch_fiefdom_by_id(fiefdom_id, FetchOptions::all())?)
    }

    pub fn fetch_fiefdoms_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<FiefdomData>, EngineError> {
        Ok(self.engine.store().fetch_fiefdoms_by_owner(owner_id)?)
    }

    /// `(tag, description)` for every registered action.
    pub fn registered_actions(&self) -> Vec<(String, String)> {
        let registry = self.engine.registry();
        registry
            .registered_tags()
            .into_iter()
            .map(|tag| {
                (
                    tag.to_string(),
                    registry.description(tag).unwrap_or_default().to_string(),
                )
            })
            .collect()
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

    fn test_catalog() -> ConfigCache {
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
        types.insert(
            "barracks".to_string(),
            BuildingTypeConfig {
                max_level: 2,
                width: 3,
                height: 3,
                gold_cost: vec![250, 700],
                construction_times: vec![900, 2_700],
                ..Default::default()
            },
        );
        ConfigCache::synthetic(types)
    }

    fn api_fixture() -> (EngineApi, i64) {
        let mut api = EngineApi::in_memory(test_catalog()).unwrap();
        let fiefdom_id = api
            .engine()
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
        (api, fiefdom_id)
    }

    #[test]
    fn dispatch_refreshes_the_requesting_fiefdom_first() {
        let (mut api, fiefdom_id) = api_fixture();
        let ctx = ActionContext::new(1, fiefdom_id);

        let built = api.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "home_base", "x": 0, "y": 0}),
            &ctx,
            NOW,
        );
        assert!(built.is_ok());

        // Before the home base completes, other buildings are refused.
        let early = api.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "barracks", "x": 6, "y": 6}),
            &ctx,
            NOW + 10,
        );
        assert_eq!(early.error_code, Some(ActionError::HomeBaseRequired));

        // Once the construction window has passed, the pre-dispatch refresh
        // completes the home base and the same request succeeds.
        let later = api.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "barracks", "x": 6, "y": 6}),
            &ctx,
            NOW + 700,
        );
        assert!(later.is_ok(), "unexpected failure: {:?}", later.error_code);
    }

    #[test]
    fn registered_actions_lists_the_stable_surface() {
        let (api, _) = api_fixture();
        let actions = api.registered_actions();
        assert_eq!(actions.len(), 8);
        assert!(actions.iter().any(|(tag, _)| tag == "build_wall"));
    }

    #[test]
    fn persists_across_reopen() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let db_path = std::env::temp_dir().join(format!("fiefdom_api_{nanos}.sqlite"));
        let config_dir = std::env::temp_dir().join(format!("fiefdom_api_cfg_{nanos}"));
        std::fs::create_dir_all(&config_dir).unwrap();
        for name in [
            "damage_types.json",
            "fiefdom_building_types.json",
            "player_combatants.json",
            "enemy_combatants.json",
            "heroes.json",
            "fiefdom_officials.json",
        ] {
            std::fs::write(config_dir.join(name), "{}").unwrap();
        }

        let fiefdom_id = {
            let mut api = EngineApi::open(&db_path, &config_dir).unwrap();
            api.engine()
                .store()
                .create_fiefdom(9, "Thornholt", 4, 4, 0, &ResourceBalances::default())
                .unwrap()
        };

        let mut reopened = EngineApi::open(&db_path, &config_dir).unwrap();
        let fiefdom = reopened.fetch_fiefdom(fiefdom_id).unwrap().unwrap();
        assert_eq!(fiefdom.name, "Thornholt");

        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("sqlite-shm"));
        let _ = std::fs::remove_dir_all(&config_dir);
    }
}

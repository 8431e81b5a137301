//! Property suite for the engine's quantified invariants: non-negative
//! balances, diff faithfulness, self-exclusion on move, morale clamping, and
//! curve extrapolation.

use std::collections::BTreeMap;

use contracts::config::{extrapolate_entry, BuildingTypeConfig, MoraleEffectMode};
use contracts::{
    ActionContext, ActionError, DiffValue, Resource, ResourceBalances,
};
use engine_core::spatial::Rect;
use engine_core::{ConfigCache, Engine, MoraleAggregator};
use proptest::prelude::*;
use serde_json::json;

const NOW: i64 = 1_700_000_000;

fn catalog() -> ConfigCache {
    let mut types = BTreeMap::new();
    types.insert(
        "home_base".to_string(),
        BuildingTypeConfig {
            max_level: 3,
            width: 4,
            height: 4,
            gold_cost: vec![200, 500, 1_200],
            construction_times: vec![600, 1_800, 5_400],
            ..Default::default()
        },
    );
    types.insert(
        "farm".to_string(),
        BuildingTypeConfig {
            max_level: 3,
            width: 2,
            height: 2,
            gold_cost: vec![200, 300, 500],
            wood_cost: vec![100, 150, 250],
            construction_times: vec![300, 600, 900],
            ..Default::default()
        },
    );
    ConfigCache::synthetic(types)
}

fn engine_with_balances(balances: ResourceBalances) -> (Engine, i64, ActionContext) {
    let mut engine = Engine::in_memory(catalog()).expect("engine");
    let fiefdom_id = engine
        .store()
        .create_fiefdom(1, "Duskmere", 0, 0, 0, &balances)
        .expect("fiefdom");
    let ctx = ActionContext::new(1, fiefdom_id);
    (engine, fiefdom_id, ctx)
}

/// Replay fiefdom-resource diffs over a pre-state, checking that each diff's
/// `from_value` matches the state it is applied to.
fn apply_diffs(mut balances: ResourceBalances, diffs: &[DiffValue]) -> ResourceBalances {
    for diff in diffs {
        assert_eq!(diff.source_type, "fiefdom");
        let resource = Resource::parse(&diff.field).expect("resource field");
        assert_eq!(
            diff.from_value.as_i64().expect("from"),
            balances.get(resource),
            "diff does not chain from the current state"
        );
        *balances.get_mut(resource) = diff.to_value.as_i64().expect("to");
    }
    balances
}

proptest! {
    #[test]
    fn balances_never_go_negative(gold in 0i64..600) {
        let (mut engine, fiefdom_id, ctx) = engine_with_balances(ResourceBalances {
            gold,
            ..Default::default()
        });

        let result = engine.dispatch_at(
            "build",
            &json!({"fiefdom_id": fiefdom_id, "building_type": "home_base", "x": 0, "y": 0}),
            &ctx,
            NOW,
        );

        let balances = engine
            .store()
            .fetch_fiefdom_resources(fiefdom_id)
            .unwrap()
            .unwrap();
        prop_assert!(balances.gold >= 0);
        if result.is_ok() {
            prop_assert_eq!(balances.gold, gold - 200);
        } else {
            prop_assert_eq!(result.error_code, Some(ActionError::InsufficientResources));
            prop_assert_eq!(balances.gold, gold);
        }
    }

    #[test]
    fn diffs_replay_pre_state_into_post_state(level in 1i64..=3) {
        let (mut engine, fiefdom_id, ctx) = engine_with_balances(ResourceBalances {
            gold: 5_000,
            wood: 5_000,
            ..Default::default()
        });
        engine
            .store()
            .create_building(fiefdom_id, "home_base", 1, 0, 0, 0)
            .unwrap();
        let farm_id = engine
            .store()
            .create_building(fiefdom_id, "farm", level, 10, 10, 0)
            .unwrap();
        let pre = engine
            .store()
            .fetch_fiefdom_resources(fiefdom_id)
            .unwrap()
            .unwrap();

        let result = engine.dispatch_at(
            "demolish",
            &json!({"building_id": farm_id}),
            &ctx,
            NOW,
        );
        prop_assert!(result.is_ok());

        let post = engine
            .store()
            .fetch_fiefdom_resources(fiefdom_id)
            .unwrap()
            .unwrap();
        prop_assert_eq!(apply_diffs(pre, &result.side_effects), post);
    }

    #[test]
    fn moving_onto_own_footprint_always_succeeds(
        x in -900i64..900,
        y in -900i64..900,
    ) {
        let (mut engine, fiefdom_id, ctx) = engine_with_balances(ResourceBalances {
            gold: 10_000,
            wood: 10_000,
            ..Default::default()
        });
        engine
            .store()
            .create_building(fiefdom_id, "home_base", 1, 0, 0, 0)
            .unwrap();
        let farm_id = engine
            .store()
            .create_building(fiefdom_id, "farm", 1, x, y, 0)
            .unwrap();

        let result = engine.dispatch_at(
            "move",
            &json!({"building_id": farm_id, "x": x, "y": y}),
            &ctx,
            NOW,
        );
        // The exclude-self check must accept the old footprint. The only
        // other legal outcome here is colliding with the seeded home base.
        if result.error_code == Some(ActionError::InvalidLocation) {
            let candidate = Rect::new(x, y, 2, 2);
            prop_assert!(candidate.overlaps(&Rect::new(0, 0, 4, 4)));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn rect_overlap_is_symmetric(
        ax in -50i64..50, ay in -50i64..50, aw in 1i64..8, ah in 1i64..8,
        bx in -50i64..50, by in -50i64..50, bw in 1i64..8, bh in 1i64..8,
    ) {
        let a = Rect::new(ax, ay, aw, ah);
        let b = Rect::new(bx, by, bw, bh);
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert!(a.overlaps(&a));
    }

    #[test]
    fn morale_is_always_clamped(
        boost in -3_000.0f64..3_000.0,
        count in 0u32..6,
        mode in prop_oneof![
            Just(MoraleEffectMode::Add),
            Just(MoraleEffectMode::Max),
            Just(MoraleEffectMode::Multiply),
        ],
    ) {
        let mut types = BTreeMap::new();
        types.insert(
            "shrine".to_string(),
            BuildingTypeConfig {
                morale_boost: Some(boost),
                morale_effect_mode: mode,
                ..Default::default()
            },
        );
        let config = ConfigCache::synthetic(types);

        let mut fiefdom = contracts::entities::FiefdomData {
            id: 1,
            owner_id: 1,
            name: "Duskmere".into(),
            x: 0,
            y: 0,
            peasants: 0,
            balances: ResourceBalances::default(),
            wall_count: 0,
            morale: 0.0,
            last_update_time: 0,
            buildings: Vec::new(),
            walls: Vec::new(),
            officials: Vec::new(),
            heroes: Vec::new(),
            stationed_combatants: Vec::new(),
        };
        for i in 0..count {
            fiefdom.buildings.push(contracts::entities::BuildingData {
                id: i64::from(i),
                fiefdom_id: 1,
                name: "shrine".into(),
                level: 1,
                x: i64::from(i) * 2,
                y: 0,
                construction_start_ts: 0,
            });
        }

        let morale = MoraleAggregator::new(&config).fiefdom_morale(&fiefdom);
        prop_assert!((-1_000.0..=1_000.0).contains(&morale));
    }

    #[test]
    fn extrapolation_is_linear_beyond_the_curve(
        base in 1i64..1_000,
        slope in 0i64..200,
        len in 2usize..6,
        beyond in 0usize..5,
    ) {
        let values: Vec<i64> = (0..len as i64).map(|i| base + slope * i).collect();
        let index = len - 1 + beyond;
        let expected = base + slope * index as i64;
        prop_assert_eq!(extrapolate_entry(&values, index), Some(expected));
    }
}

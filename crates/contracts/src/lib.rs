//! Cross-boundary contracts for the fiefdom action engine: action results,
//! field diffs, error codes, resource accounting types, and time-advance
//! reports shared by the engine, its embedders, and the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod config;
pub mod entities;

/// Build coordinates are confined to this envelope. Wall perimeters are
/// centred at the origin and must fit inside it, so the bound is a domain
/// invariant rather than a sanity check.
pub const COORDINATE_RANGE: i64 = 1000;

/// Fiefdom morale is clamped to `[-MORALE_BOUND, MORALE_BOUND]`.
pub const MORALE_BOUND: f64 = 1000.0;

/// The mandatory root building of a fiefdom.
pub const HOME_BASE: &str = "home_base";

/// The eight fungible resources a fiefdom stockpiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Gold,
    Wood,
    Stone,
    Steel,
    Bronze,
    Grain,
    Leather,
    Mana,
}

impl Resource {
    pub const ALL: [Resource; 8] = [
        Resource::Gold,
        Resource::Wood,
        Resource::Stone,
        Resource::Steel,
        Resource::Bronze,
        Resource::Grain,
        Resource::Leather,
        Resource::Mana,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Gold => "gold",
            Resource::Wood => "wood",
            Resource::Stone => "stone",
            Resource::Steel => "steel",
            Resource::Bronze => "bronze",
            Resource::Grain => "grain",
            Resource::Leather => "leather",
            Resource::Mana => "mana",
        }
    }

    pub fn parse(name: &str) -> Option<Resource> {
        Resource::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fiefdom's current stockpile of every resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBalances {
    pub gold: i64,
    pub wood: i64,
    pub stone: i64,
    pub steel: i64,
    pub bronze: i64,
    pub grain: i64,
    pub leather: i64,
    pub mana: i64,
}

impl ResourceBalances {
    pub fn get(&self, resource: Resource) -> i64 {
        match resource {
            Resource::Gold => self.gold,
            Resource::Wood => self.wood,
            Resource::Stone => self.stone,
            Resource::Steel => self.steel,
            Resource::Bronze => self.bronze,
            Resource::Grain => self.grain,
            Resource::Leather => self.leather,
            Resource::Mana => self.mana,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut i64 {
        match resource {
            Resource::Gold => &mut self.gold,
            Resource::Wood => &mut self.wood,
            Resource::Stone => &mut self.stone,
            Resource::Steel => &mut self.steel,
            Resource::Bronze => &mut self.bronze,
            Resource::Grain => &mut self.grain,
            Resource::Leather => &mut self.leather,
            Resource::Mana => &mut self.mana,
        }
    }
}

/// A named quantity of resources, keyed sparsely: absent resources mean zero.
pub type ResourceAmounts = std::collections::BTreeMap<Resource, i64>;

/// Outcome class of one engine invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Ok,
    Fail,
    Partial,
}

/// Stable machine-readable error codes surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionError {
    FiefdomIdRequired,
    BuildingTypeRequired,
    BuildingIdRequired,
    WallGenerationRequired,
    CoordinatesRequired,
    NotOwner,
    UnknownBuilding,
    UnknownAction,
    InvalidConfig,
    InvalidLocation,
    HomeBaseExists,
    HomeBaseRequired,
    HomeBaseImmutable,
    HomeBaseOrigin,
    OutOfRange,
    CannotMoveUnderConstruction,
    UpgradeInProgress,
    MaxLevelReached,
    InsufficientResources,
    GenerationSequenceRequired,
    GenerationExists,
    MissingWallConfig,
    InvalidWallPlacement,
    NotImplemented,
    DatabaseError,
}

impl ActionError {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionError::FiefdomIdRequired => "fiefdom_id_required",
            ActionError::BuildingTypeRequired => "building_type_required",
            ActionError::BuildingIdRequired => "building_id_required",
            ActionError::WallGenerationRequired => "wall_generation_required",
            ActionError::CoordinatesRequired => "coordinates_required",
            ActionError::NotOwner => "not_owner",
            ActionError::UnknownBuilding => "unknown_building",
            ActionError::UnknownAction => "unknown_action",
            ActionError::InvalidConfig => "invalid_config",
            ActionError::InvalidLocation => "invalid_location",
            ActionError::HomeBaseExists => "home_base_exists",
            ActionError::HomeBaseRequired => "home_base_required",
            ActionError::HomeBaseImmutable => "home_base_immutable",
            ActionError::HomeBaseOrigin => "home_base_origin",
            ActionError::OutOfRange => "out_of_range",
            ActionError::CannotMoveUnderConstruction => "cannot_move_under_construction",
            ActionError::UpgradeInProgress => "upgrade_in_progress",
            ActionError::MaxLevelReached => "max_level_reached",
            ActionError::InsufficientResources => "insufficient_resources",
            ActionError::GenerationSequenceRequired => "generation_sequence_required",
            ActionError::GenerationExists => "generation_exists",
            ActionError::MissingWallConfig => "missing_wall_config",
            ActionError::InvalidWallPlacement => "invalid_wall_placement",
            ActionError::NotImplemented => "not_implemented",
            ActionError::DatabaseError => "database_error",
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity of the request this action runs on behalf of.
/// Populated by the caller's auth layer; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionContext {
    pub requesting_character_id: i64,
    pub requesting_fiefdom_id: i64,
    pub request_id: String,
    pub ip_address: String,
}

impl ActionContext {
    pub fn new(requesting_character_id: i64, requesting_fiefdom_id: i64) -> Self {
        Self {
            requesting_character_id,
            requesting_fiefdom_id,
            request_id: String::new(),
            ip_address: String::new(),
        }
    }
}

/// One field-level before/after record, emitted in mutation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffValue {
    pub field: String,
    pub source_type: String,
    pub source_id: i64,
    pub entity_key: String,
    pub from_value: Value,
    pub to_value: Value,
}

impl DiffValue {
    pub fn fiefdom_field(
        fiefdom_id: i64,
        field: impl Into<String>,
        from_value: impl Into<Value>,
        to_value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            source_type: "fiefdom".to_string(),
            source_id: fiefdom_id,
            entity_key: "fiefdom_id".to_string(),
            from_value: from_value.into(),
            to_value: to_value.into(),
        }
    }
}

/// The engine's only public return type: every dispatch path yields one of
/// these, never an `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: ActionStatus,
    pub error_code: Option<ActionError>,
    pub error_message: Option<String>,
    pub result: Map<String, Value>,
    pub side_effects: Vec<DiffValue>,
    pub action_timestamp: i64,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            status: ActionStatus::Ok,
            error_code: None,
            error_message: None,
            result: Map::new(),
            side_effects: Vec::new(),
            action_timestamp: 0,
        }
    }

    pub fn fail(code: ActionError, message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Fail,
            error_code: Some(code),
            error_message: Some(message.into()),
            result: Map::new(),
            side_effects: Vec::new(),
            action_timestamp: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ActionStatus::Ok
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.result.insert(key.into(), value.into());
    }
}

/// Everything a fiefdom can accrue over time: the eight resources plus
/// population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockKind {
    Peasants,
    Gold,
    Wood,
    Stone,
    Steel,
    Bronze,
    Grain,
    Leather,
    Mana,
}

impl StockKind {
    pub const ALL: [StockKind; 9] = [
        StockKind::Peasants,
        StockKind::Gold,
        StockKind::Wood,
        StockKind::Stone,
        StockKind::Steel,
        StockKind::Bronze,
        StockKind::Grain,
        StockKind::Leather,
        StockKind::Mana,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StockKind::Peasants => "peasants",
            StockKind::Gold => "gold",
            StockKind::Wood => "wood",
            StockKind::Stone => "stone",
            StockKind::Steel => "steel",
            StockKind::Bronze => "bronze",
            StockKind::Grain => "grain",
            StockKind::Leather => "leather",
            StockKind::Mana => "mana",
        }
    }

    pub fn parse(name: &str) -> Option<StockKind> {
        StockKind::ALL.into_iter().find(|k| k.as_str() == name)
    }

    pub fn as_resource(self) -> Option<Resource> {
        Resource::parse(self.as_str())
    }
}

/// One resource accrual applied by the time advancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionUpdate {
    pub resource_type: StockKind,
    pub amount_produced: f64,
    pub source_type: String,
    pub source_id: i64,
    pub fiefdom_id: i64,
}

/// A construction or upgrade the time advancer found overdue and committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedConstruction {
    pub name: String,
    pub level: i64,
}

/// Morale recomputed and written back during a time advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleChange {
    pub fiefdom_id: i64,
    pub morale: f64,
}

/// Batch report of one `advance` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeUpdateResult {
    pub new_timestamp: i64,
    pub time_hours_elapsed: f64,
    pub productions: Vec<ProductionUpdate>,
    pub completed_trainings: Vec<CompletedConstruction>,
    pub morale_changes: Vec<MoraleChange>,
    pub fiefdoms_updated: usize,
    pub production_updates_applied: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_serialize_to_stable_strings() {
        let json = serde_json::to_value(ActionError::GenerationSequenceRequired).unwrap();
        assert_eq!(json, Value::String("generation_sequence_required".into()));
        assert_eq!(
            ActionError::CannotMoveUnderConstruction.as_str(),
            "cannot_move_under_construction"
        );
    }

    #[test]
    fn balances_roundtrip_by_resource() {
        let mut balances = ResourceBalances::default();
        for resource in Resource::ALL {
            *balances.get_mut(resource) = 7;
        }
        assert!(Resource::ALL.iter().all(|r| balances.get(*r) == 7));
    }

    #[test]
    fn fail_result_carries_code_and_message() {
        let result = ActionResult::fail(ActionError::NotOwner, "nope");
        assert_eq!(result.status, ActionStatus::Fail);
        assert_eq!(result.error_code, Some(ActionError::NotOwner));
        assert!(!result.is_ok());
    }
}

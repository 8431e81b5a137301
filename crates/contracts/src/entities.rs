//! Typed snapshots of the persisted game entities.

use serde::{Deserialize, Serialize};

use crate::ResourceBalances;

/// The eight fixed offices a fiefdom can staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialRole {
    Bailiff,
    Wizard,
    Architect,
    Steward,
    Reeve,
    Beadle,
    Constable,
    Forester,
}

impl OfficialRole {
    pub fn as_str(self) -> &'static str {
        match self {
            OfficialRole::Bailiff => "bailiff",
            OfficialRole::Wizard => "wizard",
            OfficialRole::Architect => "architect",
            OfficialRole::Steward => "steward",
            OfficialRole::Reeve => "reeve",
            OfficialRole::Beadle => "beadle",
            OfficialRole::Constable => "constable",
            OfficialRole::Forester => "forester",
        }
    }

    pub fn parse(name: &str) -> Option<OfficialRole> {
        let lower = name.to_ascii_lowercase();
        [
            OfficialRole::Bailiff,
            OfficialRole::Wizard,
            OfficialRole::Architect,
            OfficialRole::Steward,
            OfficialRole::Reeve,
            OfficialRole::Beadle,
            OfficialRole::Constable,
            OfficialRole::Forester,
        ]
        .into_iter()
        .find(|role| role.as_str() == lower)
    }
}

/// A building row. `level == 0` means under construction; `level >= 1` is
/// operational at that level. `construction_start_ts` is non-zero while a
/// level transition is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    pub id: i64,
    pub fiefdom_id: i64,
    pub name: String,
    pub level: i64,
    pub x: i64,
    pub y: i64,
    pub construction_start_ts: i64,
}

impl BuildingData {
    pub fn is_operational(&self) -> bool {
        self.level >= 1
    }
}

/// A wall row, keyed by `(fiefdom_id, generation)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallData {
    pub id: i64,
    pub fiefdom_id: i64,
    pub generation: i64,
    pub level: i64,
    pub hp: i64,
    pub construction_start_ts: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialData {
    pub id: i64,
    pub role: OfficialRole,
    pub template_id: String,
    pub portrait_id: i64,
    pub name: String,
    pub level: i64,
    pub intelligence: u8,
    pub charisma: u8,
    pub wisdom: u8,
    pub diligence: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiefdomHero {
    pub id: i64,
    pub hero_config_id: String,
    pub level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationedCombatant {
    pub id: i64,
    pub combatant_config_id: String,
    pub level: i64,
}

/// A fiefdom row plus whichever child collections the caller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiefdomData {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub peasants: i64,
    #[serde(flatten)]
    pub balances: ResourceBalances,
    pub wall_count: i64,
    pub morale: f64,
    pub last_update_time: i64,
    #[serde(default)]
    pub buildings: Vec<BuildingData>,
    #[serde(default)]
    pub walls: Vec<WallData>,
    #[serde(default)]
    pub officials: Vec<OfficialData>,
    #[serde(default)]
    pub heroes: Vec<FiefdomHero>,
    #[serde(default)]
    pub stationed_combatants: Vec<StationedCombatant>,
}

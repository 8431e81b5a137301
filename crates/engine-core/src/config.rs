//! Process-lifetime catalogue cache: loads the configuration documents once
//! at startup and serves them read-only to every handler afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use contracts::config::{
    BuildingTypeConfig, CombatantTemplate, DamageType, HeroTemplate, OfficialTemplate, WallCatalog,
    WallGenerationConfig,
};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Immutable holder of the parsed catalogues.
///
/// A failed load leaves `loaded` false; config-dependent validation then
/// fails with `invalid_config` until the operator fixes the documents and
/// restarts. Reads never lock: the cache is never mutated after construction.
#[derive(Debug, Clone)]
pub struct ConfigCache {
    loaded: bool,
    building_types: BTreeMap<String, BuildingTypeConfig>,
    wall_catalog: WallCatalog,
    heroes: BTreeMap<String, HeroTemplate>,
    player_combatants: BTreeMap<String, CombatantTemplate>,
    enemy_combatants: BTreeMap<String, CombatantTemplate>,
    officials: BTreeMap<String, OfficialTemplate>,
    damage_types: BTreeMap<String, DamageType>,
}

impl ConfigCache {
    /// Load the fixed document set from `config_dir`. Never fails outright:
    /// each unreadable or unparsable document is logged and flips the
    /// `loaded` flag off.
    pub fn load(config_dir: impl AsRef<Path>) -> Self {
        let dir = config_dir.as_ref();
        let mut ok = true;

        let damage_types = load_document(dir, "damage_types.json", &mut ok);
        let building_types = load_document(dir, "fiefdom_building_types.json", &mut ok);
        let player_combatants = load_document(dir, "player_combatants.json", &mut ok);
        let enemy_combatants = load_document(dir, "enemy_combatants.json", &mut ok);
        let heroes = load_document(dir, "heroes.json", &mut ok);
        let officials = load_document(dir, "fiefdom_officials.json", &mut ok);

        // The wall catalogue ships embedded; a wall_config.json document in
        // the directory overrides it when present.
        let wall_path = dir.join("wall_config.json");
        let wall_catalog = if wall_path.exists() {
            match read_json::<WallCatalog>(&wall_path) {
                Ok(catalog) => catalog,
                Err(message) => {
                    warn!(path = %wall_path.display(), %message, "failed to load wall catalogue");
                    ok = false;
                    WallCatalog::default()
                }
            }
        } else {
            WallCatalog::default()
        };

        Self {
            loaded: ok,
            building_types,
            wall_catalog,
            heroes,
            player_combatants,
            enemy_combatants,
            officials,
            damage_types,
        }
    }

    /// Construct a cache directly from building types, with the embedded wall
    /// catalogue and empty registries. Used by tests and embedders that build
    /// their catalogue programmatically.
    pub fn synthetic(building_types: BTreeMap<String, BuildingTypeConfig>) -> Self {
        Self {
            loaded: true,
            building_types,
            wall_catalog: WallCatalog::default(),
            heroes: BTreeMap::new(),
            player_combatants: BTreeMap::new(),
            enemy_combatants: BTreeMap::new(),
            officials: BTreeMap::new(),
            damage_types: BTreeMap::new(),
        }
    }

    pub fn with_wall_catalog(mut self, catalog: WallCatalog) -> Self {
        self.wall_catalog = catalog;
        self
    }

    pub fn with_hero(mut self, id: impl Into<String>, template: HeroTemplate) -> Self {
        self.heroes.insert(id.into(), template);
        self
    }

    pub fn with_player_combatant(
        mut self,
        id: impl Into<String>,
        template: CombatantTemplate,
    ) -> Self {
        self.player_combatants.insert(id.into(), template);
        self
    }

    pub fn with_official(mut self, id: impl Into<String>, template: OfficialTemplate) -> Self {
        self.officials.insert(id.into(), template);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn building_type(&self, name: &str) -> Option<&BuildingTypeConfig> {
        self.building_types.get(name)
    }

    pub fn building_types(&self) -> &BTreeMap<String, BuildingTypeConfig> {
        &self.building_types
    }

    pub fn wall_generation(&self, generation: i64) -> Option<&WallGenerationConfig> {
        self.wall_catalog.generation(generation)
    }

    pub fn wall_catalog(&self) -> &WallCatalog {
        &self.wall_catalog
    }

    pub fn hero(&self, id: &str) -> Option<&HeroTemplate> {
        self.heroes.get(id)
    }

    pub fn player_combatant(&self, id: &str) -> Option<&CombatantTemplate> {
        self.player_combatants.get(id)
    }

    pub fn enemy_combatant(&self, id: &str) -> Option<&CombatantTemplate> {
        self.enemy_combatants.get(id)
    }

    pub fn official_template(&self, id: &str) -> Option<&OfficialTemplate> {
        self.officials.get(id)
    }

    pub fn damage_types(&self) -> &BTreeMap<String, DamageType> {
        &self.damage_types
    }
}

fn load_document<T: DeserializeOwned + Default>(
    dir: &Path,
    file_name: &str,
    ok: &mut bool,
) -> BTreeMap<String, T> {
    let path = dir.join(file_name);
    match read_json::<BTreeMap<String, T>>(&path) {
        Ok(parsed) => parsed,
        Err(message) => {
            warn!(path = %path.display(), %message, "failed to load catalogue document");
            *ok = false;
            BTreeMap::new()
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let stripped = strip_json_comments(&raw);
    serde_json::from_str(&stripped).map_err(|err| err.to_string())
}

/// Remove `//` and `/* */` comments so the documents can carry annotations.
/// String literals are respected; newlines inside comments are kept so parse
/// errors still point at the right line.
fn strip_json_comments(raw: &str) -> String {
    #[derive(Clone, Copy)]
    enum State {
        Code,
        Str { escaped: bool },
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(raw.len());
    let mut state = State::Code;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' => {
                    state = State::Str { escaped: false };
                    out.push(c);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                _ => out.push(c),
            },
            State::Str { escaped } => {
                out.push(c);
                state = match (escaped, c) {
                    (true, _) => State::Str { escaped: false },
                    (false, '\\') => State::Str { escaped: true },
                    (false, '"') => State::Code,
                    (false, _) => State::Str { escaped: false },
                };
            }
            State::LineComment => {
                if c == '\n' {
                    out.push('\n');
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '\n' {
                    out.push('\n');
                } else if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    out
}

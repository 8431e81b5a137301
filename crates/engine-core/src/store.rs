//! Typed accessors over the persisted game entities. Every write is expected
//! to run inside a transaction opened by the caller; a `FiefdomStore` borrows
//! either a `Connection` or a `Transaction` (via deref) and never commits.

use contracts::entities::{
    BuildingData, FiefdomData, FiefdomHero, OfficialData, OfficialRole, StationedCombatant,
    WallData,
};
use contracts::{ResourceBalances, StockKind};
use rusqlite::{params, Connection, OptionalExtension};

/// Which child collections `fetch_fiefdom_by_id` should hydrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub include_buildings: bool,
    pub include_walls: bool,
    pub include_officials: bool,
    pub include_heroes: bool,
    pub include_combatants: bool,
}

impl FetchOptions {
    pub fn all() -> Self {
        Self {
            include_buildings: true,
            include_walls: true,
            include_officials: true,
            include_heroes: true,
            include_combatants: true,
        }
    }
}

#[derive(Debug)]
pub struct FiefdomStore<'c> {
    conn: &'c Connection,
}

impl<'c> FiefdomStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Create the game-namespace tables and indexes. The users/characters
    /// and messages namespaces belong to the surrounding service.
    pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS fiefdoms (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                peasants INTEGER NOT NULL DEFAULT 0,
                gold INTEGER NOT NULL DEFAULT 0,
                wood INTEGER NOT NULL DEFAULT 0,
                stone INTEGER NOT NULL DEFAULT 0,
                steel INTEGER NOT NULL DEFAULT 0,
                bronze INTEGER NOT NULL DEFAULT 0,
                grain INTEGER NOT NULL DEFAULT 0,
                leather INTEGER NOT NULL DEFAULT 0,
                mana INTEGER NOT NULL DEFAULT 0,
                wall_count INTEGER NOT NULL DEFAULT 0,
                morale REAL NOT NULL DEFAULT 0,
                last_update_time INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS fiefdom_buildings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiefdom_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 0,
                x INTEGER NOT NULL DEFAULT 0,
                y INTEGER NOT NULL DEFAULT 0,
                construction_start_ts INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(fiefdom_id) REFERENCES fiefdoms(id)
            );

            CREATE TABLE IF NOT EXISTS fiefdom_walls (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiefdom_id INTEGER NOT NULL,
                generation INTEGER NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                hp INTEGER NOT NULL DEFAULT 0,
                construction_start_ts INTEGER NOT NULL DEFAULT 0,
                last_updated INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(fiefdom_id) REFERENCES fiefdoms(id),
                UNIQUE(fiefdom_id, generation)
            );

            CREATE TABLE IF NOT EXISTS officials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiefdom_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                template_id TEXT NOT NULL,
                portrait_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                intelligence INTEGER NOT NULL,
                charisma INTEGER NOT NULL,
                wisdom INTEGER NOT NULL,
                diligence INTEGER NOT NULL,
                FOREIGN KEY(fiefdom_id) REFERENCES fiefdoms(id)
            );

            CREATE TABLE IF NOT EXISTS fiefdom_heroes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiefdom_id INTEGER NOT NULL,
                hero_config_id TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(fiefdom_id) REFERENCES fiefdoms(id)
            );

            CREATE TABLE IF NOT EXISTS stationed_combatants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fiefdom_id INTEGER NOT NULL,
                combatant_config_id TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(fiefdom_id) REFERENCES fiefdoms(id)
            );

            CREATE INDEX IF NOT EXISTS idx_fiefdoms_owner ON fiefdoms (owner_id);
            CREATE INDEX IF NOT EXISTS idx_fiefdom_buildings_fiefdom ON fiefdom_buildings (fiefdom_id);
            CREATE INDEX IF NOT EXISTS idx_fiefdom_buildings_fiefdom_xy ON fiefdom_buildings (fiefdom_id, x, y);
            CREATE INDEX IF NOT EXISTS idx_fiefdom_walls_fiefdom ON fiefdom_walls (fiefdom_id);
            CREATE INDEX IF NOT EXISTS idx_officials_fiefdom ON officials (fiefdom_id);
            CREATE INDEX IF NOT EXISTS idx_fiefdom_heroes_fiefdom ON fiefdom_heroes (fiefdom_id);
            CREATE INDEX IF NOT EXISTS idx_stationed_combatants_fiefdom ON stationed_combatants (fiefdom_id);
            ",
        )
    }

    // -----------------------------------------------------------------------
    // Fiefdoms
    // -----------------------------------------------------------------------

    pub fn fetch_fiefdom_by_id(
        &self,
        fiefdom_id: i64,
        options: FetchOptions,
    ) -> rusqlite::Result<Option<FiefdomData>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, owner_id, name, x, y, peasants,
                        gold, wood, stone, steel, bronze, grain, leather, mana,
                        wall_count, morale, last_update_time
                 FROM fiefdoms WHERE id = ?1",
                params![fiefdom_id],
                map_fiefdom_row,
            )
            .optional()?;

        let Some(mut fiefdom) = row else {
            return Ok(None);
        };

        if options.include_buildings {
            fiefdom.buildings = self.fetch_fiefdom_buildings(fiefdom_id)?;
        }
        if options.include_walls {
            fiefdom.walls = self.fetch_fiefdom_walls(fiefdom_id)?;
        }
        if options.include_officials {
            fiefdom.officials = self.fetch_fiefdom_officials(fiefdom_id)?;
        }
        if options.include_heroes {
            fiefdom.heroes = self.fetch_fiefdom_heroes(fiefdom_id)?;
        }
        if options.include_combatants {
            fiefdom.stationed_combatants = self.fetch_stationed_combatants(fiefdom_id)?;
        }

        Ok(Some(fiefdom))
    }

    pub fn fetch_fiefdoms_by_owner(&self, owner_id: i64) -> rusqlite::Result<Vec<FiefdomData>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM fiefdoms WHERE owner_id = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map(params![owner_id], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut fiefdoms = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(fiefdom) = self.fetch_fiefdom_by_id(id, FetchOptions::default())? {
                fiefdoms.push(fiefdom);
            }
        }
        Ok(fiefdoms)
    }

    pub fn fetch_all_fiefdom_ids(&self) -> rusqlite::Result<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM fiefdoms ORDER BY id")?;
        let result = stmt.query_map([], |row| row.get(0))?.collect();
        result
    }

    pub fn fiefdom_owner(&self, fiefdom_id: i64) -> rusqlite::Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT owner_id FROM fiefdoms WHERE id = ?1",
                params![fiefdom_id],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn create_fiefdom(
        &self,
        owner_id: i64,
        name: &str,
        x: i64,
        y: i64,
        peasants: i64,
        balances: &ResourceBalances,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO fiefdoms (owner_id, name, x, y, peasants,
                                   gold, wood, stone, steel, bronze, grain, leather, mana)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                owner_id,
                name,
                x,
                y,
                peasants,
                balances.gold,
                balances.wood,
                balances.stone,
                balances.steel,
                balances.bronze,
                balances.grain,
                balances.leather,
                balances.mana,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_fiefdom_resources(
        &self,
        fiefdom_id: i64,
        balances: &ResourceBalances,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdoms
             SET gold = ?1, wood = ?2, stone = ?3, steel = ?4,
                 bronze = ?5, grain = ?6, leather = ?7, mana = ?8
             WHERE id = ?9",
            params![
                balances.gold,
                balances.wood,
                balances.stone,
                balances.steel,
                balances.bronze,
                balances.grain,
                balances.leather,
                balances.mana,
                fiefdom_id,
            ],
        )?;
        Ok(())
    }

    pub fn fetch_fiefdom_resources(
        &self,
        fiefdom_id: i64,
    ) -> rusqlite::Result<Option<ResourceBalances>> {
        self.conn
            .query_row(
                "SELECT gold, wood, stone, steel, bronze, grain, leather, mana
                 FROM fiefdoms WHERE id = ?1",
                params![fiefdom_id],
                |row| {
                    Ok(ResourceBalances {
                        gold: row.get(0)?,
                        wood: row.get(1)?,
                        stone: row.get(2)?,
                        steel: row.get(3)?,
                        bronze: row.get(4)?,
                        grain: row.get(5)?,
                        leather: row.get(6)?,
                        mana: row.get(7)?,
                    })
                },
            )
            .optional()
    }

    /// Write one stock column. Production touches a single column at a time,
    /// matching the advancer's per-resource update granularity.
    pub fn update_fiefdom_stock(
        &self,
        fiefdom_id: i64,
        kind: StockKind,
        value: i64,
    ) -> rusqlite::Result<()> {
        // Column names come from a fixed enum, never from input.
        let sql = format!("UPDATE fiefdoms SET {} = ?1 WHERE id = ?2", kind.as_str());
        self.conn.execute(&sql, params![value, fiefdom_id])?;
        Ok(())
    }

    pub fn update_fiefdom_peasants(&self, fiefdom_id: i64, peasants: i64) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdoms SET peasants = ?1 WHERE id = ?2",
            params![peasants, fiefdom_id],
        )?;
        Ok(())
    }

    pub fn update_fiefdom_wall_count(
        &self,
        fiefdom_id: i64,
        wall_count: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdoms SET wall_count = ?1 WHERE id = ?2",
            params![wall_count, fiefdom_id],
        )?;
        Ok(())
    }

    pub fn update_fiefdom_morale(&self, fiefdom_id: i64, morale: f64) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdoms SET morale = ?1 WHERE id = ?2",
            params![morale, fiefdom_id],
        )?;
        Ok(())
    }

    pub fn update_fiefdom_last_update(
        &self,
        fiefdom_id: i64,
        timestamp: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdoms SET last_update_time = ?1 WHERE id = ?2",
            params![timestamp, fiefdom_id],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Buildings
    // -----------------------------------------------------------------------

    pub fn fetch_fiefdom_buildings(&self, fiefdom_id: i64) -> rusqlite::Result<Vec<BuildingData>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fiefdom_id, name, level, x, y, construction_start_ts
             FROM fiefdom_buildings WHERE fiefdom_id = ?1 ORDER BY id",
        )?;
        let result = stmt.query_map(params![fiefdom_id], map_building_row)?.collect();
        result
    }

    pub fn fetch_building(&self, building_id: i64) -> rusqlite::Result<Option<BuildingData>> {
        self.conn
            .query_row(
                "SELECT id, fiefdom_id, name, level, x, y, construction_start_ts
                 FROM fiefdom_buildings WHERE id = ?1",
                params![building_id],
                map_building_row,
            )
            .optional()
    }

    pub fn has_completed_home_base(&self, fiefdom_id: i64) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fiefdom_buildings
             WHERE fiefdom_id = ?1 AND name = ?2 AND level > 0",
            params![fiefdom_id, contracts::HOME_BASE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create_building(
        &self,
        fiefdom_id: i64,
        name: &str,
        level: i64,
        x: i64,
        y: i64,
        construction_start_ts: i64,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO fiefdom_buildings (fiefdom_id, name, level, x, y,
                                            construction_start_ts, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![fiefdom_id, name, level, x, y, construction_start_ts],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Commit a level transition: writes the new level and clears the pending
    /// construction marker in the same statement.
    pub fn update_building_level(
        &self,
        building_id: i64,
        level: i64,
        now: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdom_buildings
             SET level = ?1, construction_start_ts = 0, last_updated = ?2
             WHERE id = ?3",
            params![level, now, building_id],
        )?;
        Ok(())
    }

    pub fn update_building_construction_start(
        &self,
        building_id: i64,
        construction_start_ts: i64,
        now: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdom_buildings
             SET construction_start_ts = ?1, last_updated = ?2
             WHERE id = ?3",
            params![construction_start_ts, now, building_id],
        )?;
        Ok(())
    }

    pub fn update_building_position(
        &self,
        building_id: i64,
        x: i64,
        y: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdom_buildings SET x = ?1, y = ?2 WHERE id = ?3",
            params![x, y, building_id],
        )?;
        Ok(())
    }

    pub fn delete_building(&self, building_id: i64) -> rusqlite::Result<()> {
        self.conn.execute(
            "DELETE FROM fiefdom_buildings WHERE id = ?1",
            params![building_id],
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Walls
    // -----------------------------------------------------------------------

    pub fn fetch_fiefdom_walls(&self, fiefdom_id: i64) -> rusqlite::Result<Vec<WallData>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fiefdom_id, generation, level, hp, construction_start_ts
             FROM fiefdom_walls WHERE fiefdom_id = ?1 ORDER BY generation",
        )?;
        let result = stmt.query_map(params![fiefdom_id], map_wall_row)?.collect();
        result
    }

    pub fn fetch_wall(&self, wall_id: i64) -> rusqlite::Result<Option<WallData>> {
        self.conn
            .query_row(
                "SELECT id, fiefdom_id, generation, level, hp, construction_start_ts
                 FROM fiefdom_walls WHERE id = ?1",
                params![wall_id],
                map_wall_row,
            )
            .optional()
    }

    pub fn wall_generation_exists(
        &self,
        fiefdom_id: i64,
        generation: i64,
    ) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM fiefdom_walls WHERE fiefdom_id = ?1 AND generation = ?2",
            params![fiefdom_id, generation],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn create_wall(
        &self,
        fiefdom_id: i64,
        generation: i64,
        level: i64,
        hp: i64,
        construction_start_ts: i64,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO fiefdom_walls (fiefdom_id, generation, level, hp,
                                        construction_start_ts, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![fiefdom_id, generation, level, hp, construction_start_ts],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Commit a wall level transition, refreshing HP and clearing the pending
    /// construction marker.
    pub fn update_wall_level(
        &self,
        wall_id: i64,
        level: i64,
        hp: i64,
        now: i64,
    ) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdom_walls
             SET level = ?1, hp = ?2, construction_start_ts = 0, last_updated = ?3
             WHERE id = ?4",
            params![level, hp, now, wall_id],
        )?;
        Ok(())
    }

    pub fn update_wall_hp(&self, wall_id: i64, hp: i64) -> rusqlite::Result<()> {
        self.conn.execute(
            "UPDATE fiefdom_walls SET hp = ?1 WHERE id = ?2",
            params![hp, wall_id],
        )?;
        Ok(())
    }

    pub fn delete_wall(&self, wall_id: i64) -> rusqlite::Result<()> {
        self.conn
            .execute("DELETE FROM fiefdom_walls WHERE id = ?1", params![wall_id])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Officials, heroes, stationed combatants
    // -----------------------------------------------------------------------

    pub fn fetch_fiefdom_officials(&self, fiefdom_id: i64) -> rusqlite::Result<Vec<OfficialData>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, role, template_id, portrait_id, name, level,
                    intelligence, charisma, wisdom, diligence
             FROM officials WHERE fiefdom_id = ?1 ORDER BY id",
        )?;
        let result = stmt
            .query_map(params![fiefdom_id], |row| {
                let role_name: String = row.get(1)?;
                Ok(OfficialData {
                    id: row.get(0)?,
                    // Unknown roles in old rows degrade to bailiff rather than
                    // poisoning the whole fetch.
                    role: OfficialRole::parse(&role_name).unwrap_or(OfficialRole::Bailiff),
                    template_id: row.get(2)?,
                    portrait_id: row.get(3)?,
                    name: row.get(4)?,
                    level: row.get(5)?,
                    intelligence: row.get::<_, i64>(6)? as u8,
                    charisma: row.get::<_, i64>(7)? as u8,
                    wisdom: row.get::<_, i64>(8)? as u8,
                    diligence: row.get::<_, i64>(9)? as u8,
                })
            })?
            .collect();
        result
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_official(
        &self,
        fiefdom_id: i64,
        role: OfficialRole,
        template_id: &str,
        portrait_id: i64,
        name: &str,
        level: i64,
        stats: [u8; 4],
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO officials (fiefdom_id, role, template_id, portrait_id, name, level,
                                    intelligence, charisma, wisdom, diligence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                fiefdom_id,
                role.as_str(),
                template_id,
                portrait_id,
                name,
                level,
                stats[0] as i64,
                stats[1] as i64,
                stats[2] as i64,
                stats[3] as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn fetch_fiefdom_heroes(&self, fiefdom_id: i64) -> rusqlite::Result<Vec<FiefdomHero>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, hero_config_id, level FROM fiefdom_heroes
             WHERE fiefdom_id = ?1 ORDER BY id",
        )?;
        let result = stmt
            .query_map(params![fiefdom_id], |row| {
                Ok(FiefdomHero {
                    id: row.get(0)?,
                    hero_config_id: row.get(1)?,
                    level: row.get(2)?,
                })
            })?
            .collect();
        result
    }

    pub fn create_hero(
        &self,
        fiefdom_id: i64,
        hero_config_id: &str,
        level: i64,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO fiefdom_heroes (fiefdom_id, hero_config_id, level) VALUES (?1, ?2, ?3)",
            params![fiefdom_id, hero_config_id, level],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn fetch_stationed_combatants(
        &self,
        fiefdom_id: i64,
    ) -> rusqlite::Result<Vec<StationedCombatant>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, combatant_config_id, level FROM stationed_combatants
             WHERE fiefdom_id = ?1 ORDER BY id",
        )?;
        let result = stmt
            .query_map(params![fiefdom_id], |row| {
                Ok(StationedCombatant {
                    id: row.get(0)?,
                    combatant_config_id: row.get(1)?,
                    level: row.get(2)?,
                })
            })?
            .collect();
        result
    }

    pub fn create_stationed_combatant(
        &self,
        fiefdom_id: i64,
        combatant_config_id: &str,
        level: i64,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO stationed_combatants (fiefdom_id, combatant_config_id, level)
             VALUES (?1, ?2, ?3)",
            params![fiefdom_id, combatant_config_id, level],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

fn map_fiefdom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FiefdomData> {
    Ok(FiefdomData {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        x: row.get(3)?,
        y: row.get(4)?,
        peasants: row.get(5)?,
        balances: ResourceBalances {
            gold: row.get(6)?,
            wood: row.get(7)?,
            stone: row.get(8)?,
            steel: row.get(9)?,
            bronze: row.get(10)?,
            grain: row.get(11)?,
            leather: row.get(12)?,
            mana: row.get(13)?,
        },
        wall_count: row.get(14)?,
        morale: row.get(15)?,
        last_update_time: row.get(16)?,
        buildings: Vec::new(),
        walls: Vec::new(),
        officials: Vec::new(),
        heroes: Vec::new(),
        stationed_combatants: Vec::new(),
    })
}

fn map_building_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BuildingData> {
    Ok(BuildingData {
        id: row.get(0)?,
        fiefdom_id: row.get(1)?,
        name: row.get(2)?,
        level: row.get(3)?,
        x: row.get(4)?,
        y: row.get(5)?,
        construction_start_ts: row.get(6)?,
    })
}

fn map_wall_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WallData> {
    Ok(WallData {
        id: row.get(0)?,
        fiefdom_id: row.get(1)?,
        generation: row.get(2)?,
        level: row.get(3)?,
        hp: row.get(4)?,
        construction_start_ts: row.get(5)?,
    })
}

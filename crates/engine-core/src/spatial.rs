//! Axis-aligned placement checks: building footprints against each other and
//! against wall perimeters.

use contracts::config::WallGenerationConfig;
use contracts::entities::BuildingData;
use contracts::COORDINATE_RANGE;

use crate::config::ConfigCache;
use crate::store::FiefdomStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn contains_point(&self, px: i64, py: i64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Why a placement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    OutOfRange,
    HomeBaseOrigin,
    Overlap,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementCheck {
    pub valid: bool,
    pub overlapping_building_ids: Vec<i64>,
    pub error: Option<PlacementError>,
    pub message: String,
}

impl PlacementCheck {
    fn accepted() -> Self {
        Self {
            valid: true,
            overlapping_building_ids: Vec::new(),
            error: None,
            message: String::new(),
        }
    }

    fn rejected(error: PlacementError, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            overlapping_building_ids: Vec::new(),
            error: Some(error),
            message: message.into(),
        }
    }
}

pub fn position_in_range(x: i64, y: i64) -> bool {
    x.abs() <= COORDINATE_RANGE && y.abs() <= COORDINATE_RANGE
}

#[derive(Debug, Clone, Copy)]
pub struct SpatialChecker<'a> {
    config: &'a ConfigCache,
}

impl<'a> SpatialChecker<'a> {
    pub fn new(config: &'a ConfigCache) -> Self {
        Self { config }
    }

    /// Footprint of a building type; unknown types occupy a single cell.
    pub fn dimensions(&self, building_type: &str) -> (i64, i64) {
        self.config
            .building_type(building_type)
            .map(|config| (config.width, config.height))
            .unwrap_or((1, 1))
    }

    /// Placement check against the fiefdom's persisted buildings.
    /// `exclude_building_id` removes one building from consideration so a
    /// move does not collide with its own old footprint.
    pub fn check_placement(
        &self,
        store: &FiefdomStore<'_>,
        fiefdom_id: i64,
        building_type: &str,
        x: i64,
        y: i64,
        enforce_home_base_origin: bool,
        exclude_building_id: Option<i64>,
    ) -> rusqlite::Result<PlacementCheck> {
        if !position_in_range(x, y) {
            return Ok(PlacementCheck::rejected(
                PlacementError::OutOfRange,
                "position is outside the valid range",
            ));
        }

        let existing = store.fetch_fiefdom_buildings(fiefdom_id)?;
        Ok(self.check_placement_against(
            building_type,
            x,
            y,
            enforce_home_base_origin,
            &existing,
            exclude_building_id,
        ))
    }

    /// Pure placement core over an already-fetched building list.
    pub fn check_placement_against(
        &self,
        building_type: &str,
        x: i64,
        y: i64,
        enforce_home_base_origin: bool,
        existing: &[BuildingData],
        exclude_building_id: Option<i64>,
    ) -> PlacementCheck {
        if !position_in_range(x, y) {
            return PlacementCheck::rejected(
                PlacementError::OutOfRange,
                "position is outside the valid range",
            );
        }

        if building_type == contracts::HOME_BASE && enforce_home_base_origin && (x != 0 || y != 0) {
            return PlacementCheck::rejected(
                PlacementError::HomeBaseOrigin,
                "home_base must be placed at (0, 0)",
            );
        }

        let (width, height) = self.dimensions(building_type);
        let candidate = Rect::new(x, y, width, height);

        let mut check = PlacementCheck::accepted();
        for building in existing {
            if exclude_building_id == Some(building.id) {
                continue;
            }
            let (bw, bh) = self.dimensions(&building.name);
            let footprint = Rect::new(building.x, building.y, bw, bh);
            if candidate.overlaps(&footprint) {
                check.valid = false;
                check.overlapping_building_ids.push(building.id);
            }
        }

        if !check.valid {
            check.error = Some(PlacementError::Overlap);
            check.message = "location overlaps with existing buildings".to_string();
        }

        check
    }

    /// The four edge rectangles of a generation's hollow perimeter, centred
    /// at the origin.
    pub fn wall_perimeter_rects(config: &WallGenerationConfig) -> [Rect; 4] {
        let half_w = config.width / 2;
        let half_l = config.length / 2;
        let thickness = config.thickness;
        [
            // west
            Rect::new(-half_w, -half_l, thickness, config.length),
            // east
            Rect::new(half_w - thickness, -half_l, thickness, config.length),
            // south
            Rect::new(-half_w, -half_l, config.width, thickness),
            // north
            Rect::new(-half_w, half_l - thickness, config.width, thickness),
        ]
    }

    /// Whether the perimeter fits inside the coordinate envelope. Perimeters
    /// are origin-centred, so this is a pure config property.
    pub fn wall_fits_world(config: &WallGenerationConfig) -> bool {
        config.width / 2 <= COORDINATE_RANGE && config.length / 2 <= COORDINATE_RANGE
    }

    pub fn overlaps_walls(
        &self,
        generation_config: &WallGenerationConfig,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    ) -> bool {
        let footprint = Rect::new(x, y, width, height);
        Self::wall_perimeter_rects(generation_config)
            .iter()
            .any(|edge| footprint.overlaps(edge))
    }

    /// Operational buildings whose footprint intersects the generation's
    /// perimeter; the build-wall handler cascade-demolishes these.
    pub fn overlapping_operational_buildings(
        &self,
        store: &FiefdomStore<'_>,
        fiefdom_id: i64,
        generation_config: &WallGenerationConfig,
    ) -> rusqlite::Result<Vec<BuildingData>> {
        let buildings = store.fetch_fiefdom_buildings(fiefdom_id)?;
        Ok(buildings
            .into_iter()
            .filter(|building| {
                if !building.is_operational() {
                    return false;
                }
                let (width, height) = self.dimensions(&building.name);
                self.overlaps_walls(generation_config, building.x, building.y, width, height)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::config::BuildingTypeConfig;
    use std::collections::BTreeMap;

    fn test_config() -> ConfigCache {
        let mut types = BTreeMap::new();
        types.insert(
            "home_base".to_string(),
            BuildingTypeConfig {
                width: 4,
                height: 4,
                ..Default::default()
            },
        );
        types.insert(
            "farm".to_string(),
            BuildingTypeConfig {
                width: 2,
                height: 2,
                ..Default::default()
            },
        );
        ConfigCache::synthetic(types)
    }

    fn building(id: i64, name: &str, level: i64, x: i64, y: i64) -> BuildingData {
        BuildingData {
            id,
            fiefdom_id: 1,
            name: name.to_string(),
            level,
            x,
            y,
            construction_start_ts: 0,
        }
    }

    #[test]
    fn rect_overlap_is_strict_on_edges() {
        let a = Rect::new(0, 0, 2, 2);
        assert!(a.overlaps(&Rect::new(1, 1, 2, 2)));
        // Touching edges do not overlap.
        assert!(!a.overlaps(&Rect::new(2, 0, 2, 2)));
        assert!(!a.overlaps(&Rect::new(0, 2, 2, 2)));
    }

    #[test]
    fn unknown_type_defaults_to_single_cell() {
        let config = test_config();
        let checker = SpatialChecker::new(&config);
        assert_eq!(checker.dimensions("gatehouse"), (1, 1));
        assert_eq!(checker.dimensions("farm"), (2, 2));
    }

    #[test]
    fn placement_rejects_outside_envelope() {
        let config = test_config();
        let checker = SpatialChecker::new(&config);
        let check = checker.check_placement_against("farm", 1_001, 0, false, &[], None);
        assert!(!check.valid);
        assert_eq!(check.error, Some(PlacementError::OutOfRange));
    }

    #[test]
    fn home_base_must_sit_at_origin_when_enforced() {
        let config = test_config();
        let checker = SpatialChecker::new(&config);

        let off_origin = checker.check_placement_against("home_base", 1, 0, true, &[], None);
        assert_eq!(off_origin.error, Some(PlacementError::HomeBaseOrigin));

        let at_origin = checker.check_placement_against("home_base", 0, 0, true, &[], None);
        assert!(at_origin.valid);
    }

    #[test]
    fn overlap_collects_every_colliding_id() {
        let config = test_config();
        let checker = SpatialChecker::new(&config);
        let existing = vec![building(10, "farm", 1, 0, 0), building(11, "farm", 1, 1, 1)];

        let check = checker.check_placement_against("farm", 0, 0, false, &existing, None);
        assert!(!check.valid);
        assert_eq!(check.overlapping_building_ids, vec![10, 11]);
        assert_eq!(check.error, Some(PlacementError::Overlap));
    }

    #[test]
    fn excluded_building_does_not_collide_with_itself() {
        let config = test_config();
        let checker = SpatialChecker::new(&config);
        let existing = vec![building(10, "farm", 2, 10, 10)];

        let check = checker.check_placement_against("farm", 10, 10, false, &existing, Some(10));
        assert!(check.valid);
    }

    #[test]
    fn perimeter_edges_cover_the_ring_but_not_the_yard() {
        let generation = WallGenerationConfig {
            width: 40,
            length: 40,
            thickness: 2,
            ..Default::default()
        };
        let config = test_config();
        let checker = SpatialChecker::new(&config);

        // On the western edge.
        assert!(checker.overlaps_walls(&generation, -20, 0, 2, 2));
        // Inside the yard.
        assert!(!checker.overlaps_walls(&generation, 0, 0, 2, 2));
        // Outside the ring entirely.
        assert!(!checker.overlaps_walls(&generation, 30, 30, 2, 2));
    }

    #[test]
    fn perimeter_fits_inside_world_envelope() {
        let mut generation = WallGenerationConfig {
            width: 40,
            length: 40,
            thickness: 2,
            ..Default::default()
        };
        assert!(SpatialChecker::wall_fits_world(&generation));
        generation.width = 2 * COORDINATE_RANGE + 2;
        assert!(!SpatialChecker::wall_fits_world(&generation));
    }
}

//! Resource accounting: balance reads, underflow-refusing deductions,
//! refunds, and the cost arithmetic behind demolish, upgrade, and move.

use std::fmt;

use contracts::config::{extrapolate_entry, BuildingTypeConfig, WallGenerationConfig};
use contracts::{ActionResult, DiffValue, Resource, ResourceAmounts};

use crate::store::FiefdomStore;

/// Demolition refunds 80% of the cumulative build cost, floored per resource.
const REFUND_NUMERATOR: i64 = 4;
const REFUND_DENOMINATOR: i64 = 5;

/// Moving costs a tenth of the current level's build cost.
const MOVE_COST_DIVISOR: i64 = 10;

#[derive(Debug)]
pub enum LedgerError {
    Database(rusqlite::Error),
    /// The deduction would take this resource below zero; nothing was written.
    Insufficient(Resource),
    FiefdomMissing(i64),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(err) => write!(f, "ledger database error: {err}"),
            Self::Insufficient(resource) => write!(f, "not enough {resource}"),
            Self::FiefdomMissing(id) => write!(f, "fiefdom {id} does not exist"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Database(value)
    }
}

/// Balance mutations for one fiefdom. All writes are batched into a single
/// row update per call; diffs are appended in `Resource::ALL` order.
#[derive(Debug)]
pub struct ResourceLedger<'c> {
    store: FiefdomStore<'c>,
}

impl<'c> ResourceLedger<'c> {
    pub fn new(conn: &'c rusqlite::Connection) -> Self {
        Self {
            store: FiefdomStore::new(conn),
        }
    }

    pub fn has_enough(&self, fiefdom_id: i64, costs: &ResourceAmounts) -> Result<bool, LedgerError> {
        let balances = self
            .store
            .fetch_fiefdom_resources(fiefdom_id)?
            .ok_or(LedgerError::FiefdomMissing(fiefdom_id))?;
        Ok(costs
            .iter()
            .all(|(resource, amount)| balances.get(*resource) >= *amount))
    }

    /// Subtract each named cost and append one diff per changed field.
    /// Refuses to underflow: on insufficient balance nothing is written and
    /// no diff is appended.
    pub fn deduct(
        &self,
        fiefdom_id: i64,
        costs: &ResourceAmounts,
        result: &mut ActionResult,
    ) -> Result<(), LedgerError> {
        if costs.is_empty() {
            return Ok(());
        }

        let mut balances = self
            .store
            .fetch_fiefdom_resources(fiefdom_id)?
            .ok_or(LedgerError::FiefdomMissing(fiefdom_id))?;

        for resource in Resource::ALL {
            if let Some(amount) = costs.get(&resource) {
                if balances.get(resource) < *amount {
                    return Err(LedgerError::Insufficient(resource));
                }
            }
        }

        for resource in Resource::ALL {
            if let Some(amount) = costs.get(&resource) {
                let before = balances.get(resource);
                let after = before - amount;
                *balances.get_mut(resource) = after;
                result.side_effects.push(DiffValue::fiefdom_field(
                    fiefdom_id,
                    resource.as_str(),
                    before,
                    after,
                ));
            }
        }

        self.store.update_fiefdom_resources(fiefdom_id, &balances)?;
        Ok(())
    }

    /// Additive mirror of `deduct`.
    pub fn refund(
        &self,
        fiefdom_id: i64,
        amounts: &ResourceAmounts,
        result: &mut ActionResult,
    ) -> Result<(), LedgerError> {
        if amounts.is_empty() {
            return Ok(());
        }

        let mut balances = self
            .store
            .fetch_fiefdom_resources(fiefdom_id)?
            .ok_or(LedgerError::FiefdomMissing(fiefdom_id))?;

        for resource in Resource::ALL {
            if let Some(amount) = amounts.get(&resource) {
                let before = balances.get(resource);
                let after = before + amount;
                *balances.get_mut(resource) = after;
                result.side_effects.push(DiffValue::fiefdom_field(
                    fiefdom_id,
                    resource.as_str(),
                    before,
                    after,
                ));
            }
        }

        self.store.update_fiefdom_resources(fiefdom_id, &balances)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Cost arithmetic
// ---------------------------------------------------------------------------

/// Everything spent reaching `current_level`: the sum of each cost curve's
/// first `current_level` entries.
pub fn cumulative_cost(config: &BuildingTypeConfig, current_level: i64) -> ResourceAmounts {
    let mut total = ResourceAmounts::new();
    let levels = current_level.max(0) as usize;
    for resource in Resource::ALL {
        let curve = config.cost_curve(resource);
        let spent: i64 = curve.iter().take(levels).sum();
        if spent > 0 {
            total.insert(resource, spent);
        }
    }
    total
}

/// Cost of the `current_level -> current_level + 1` transition, extrapolating
/// past the end of a curve.
pub fn upgrade_cost(config: &BuildingTypeConfig, current_level: i64) -> ResourceAmounts {
    let mut cost = ResourceAmounts::new();
    let index = current_level.max(0) as usize;
    for resource in Resource::ALL {
        if let Some(amount) = extrapolate_entry(config.cost_curve(resource), index) {
            if amount > 0 {
                cost.insert(resource, amount);
            }
        }
    }
    cost
}

/// Moving a level-`level` building costs a tenth of that level's build cost.
pub fn move_cost(config: &BuildingTypeConfig, level: i64) -> ResourceAmounts {
    let mut cost = ResourceAmounts::new();
    if level < 1 {
        return cost;
    }
    let index = (level - 1) as usize;
    for resource in Resource::ALL {
        if let Some(amount) = extrapolate_entry(config.cost_curve(resource), index) {
            let tenth = amount / MOVE_COST_DIVISOR;
            if tenth > 0 {
                cost.insert(resource, tenth);
            }
        }
    }
    cost
}

/// Cost of raising a wall to `level` (level 1 is the initial build).
pub fn wall_level_cost(config: &WallGenerationConfig, level: i64) -> ResourceAmounts {
    let mut cost = ResourceAmounts::new();
    if level < 1 {
        return cost;
    }
    let index = (level - 1) as usize;
    for resource in Resource::ALL {
        if let Some(amount) = extrapolate_entry(config.cost_curve(resource), index) {
            if amount > 0 {
                cost.insert(resource, amount);
            }
        }
    }
    cost
}

/// 80% of the cumulative cost, floored per resource.
pub fn demolish_refund(config: &BuildingTypeConfig, current_level: i64) -> ResourceAmounts {
    cumulative_cost(config, current_level)
        .into_iter()
        .filter_map(|(resource, spent)| {
            let refund = spent * REFUND_NUMERATOR / REFUND_DENOMINATOR;
            (refund > 0).then_some((resource, refund))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ResourceBalances;
    use rusqlite::Connection;

    fn farm_config() -> BuildingTypeConfig {
        BuildingTypeConfig {
            gold_cost: vec![100, 250, 500],
            wood_cost: vec![50, 125, 250],
            ..Default::default()
        }
    }

    fn ledger_fixture() -> (Connection, i64) {
        let conn = Connection::open_in_memory().unwrap();
        FiefdomStore::initialize_schema(&conn).unwrap();
        let store = FiefdomStore::new(&conn);
        let balances = ResourceBalances {
            gold: 1_000,
            wood: 500,
            ..Default::default()
        };
        let fiefdom_id = store
            .create_fiefdom(1, "Duskmere", 0, 0, 0, &balances)
            .unwrap();
        (conn, fiefdom_id)
    }

    #[test]
    fn cumulative_cost_sums_completed_levels() {
        let cost = cumulative_cost(&farm_config(), 2);
        assert_eq!(cost.get(&Resource::Gold), Some(&350));
        assert_eq!(cost.get(&Resource::Wood), Some(&175));
        assert_eq!(cost.get(&Resource::Stone), None);
    }

    #[test]
    fn upgrade_cost_reads_next_level_and_extrapolates() {
        let config = farm_config();
        assert_eq!(upgrade_cost(&config, 1).get(&Resource::Gold), Some(&250));
        // Past the curve: 500 + (500 - 250) per extra level.
        assert_eq!(upgrade_cost(&config, 3).get(&Resource::Gold), Some(&750));
    }

    #[test]
    fn move_cost_is_a_tenth_of_current_level() {
        let config = farm_config();
        let cost = move_cost(&config, 2);
        assert_eq!(cost.get(&Resource::Gold), Some(&25));
        assert_eq!(cost.get(&Resource::Wood), Some(&12));
    }

    #[test]
    fn demolish_refund_floors_at_eighty_percent() {
        let mut config = farm_config();
        config.gold_cost = vec![1_000];
        config.wood_cost = vec![501];
        let refund = demolish_refund(&config, 1);
        assert_eq!(refund.get(&Resource::Gold), Some(&800));
        assert_eq!(refund.get(&Resource::Wood), Some(&400));
    }

    #[test]
    fn deduct_emits_diffs_and_writes_once() {
        let (conn, fiefdom_id) = ledger_fixture();
        let ledger = ResourceLedger::new(&conn);
        let mut result = ActionResult::ok();

        let mut costs = ResourceAmounts::new();
        costs.insert(Resource::Gold, 300);
        costs.insert(Resource::Wood, 100);
        ledger.deduct(fiefdom_id, &costs, &mut result).unwrap();

        assert_eq!(result.side_effects.len(), 2);
        assert_eq!(result.side_effects[0].field, "gold");
        assert_eq!(result.side_effects[0].from_value, 1_000);
        assert_eq!(result.side_effects[0].to_value, 700);

        let store = FiefdomStore::new(&conn);
        let balances = store.fetch_fiefdom_resources(fiefdom_id).unwrap().unwrap();
        assert_eq!((balances.gold, balances.wood), (700, 400));
    }

    #[test]
    fn deduct_refuses_underflow_without_writing() {
        let (conn, fiefdom_id) = ledger_fixture();
        let ledger = ResourceLedger::new(&conn);
        let mut result = ActionResult::ok();

        let mut costs = ResourceAmounts::new();
        costs.insert(Resource::Gold, 100);
        costs.insert(Resource::Wood, 501);
        let err = ledger.deduct(fiefdom_id, &costs, &mut result).unwrap_err();

        assert!(matches!(err, LedgerError::Insufficient(Resource::Wood)));
        assert!(result.side_effects.is_empty());

        let store = FiefdomStore::new(&conn);
        let balances = store.fetch_fiefdom_resources(fiefdom_id).unwrap().unwrap();
        assert_eq!((balances.gold, balances.wood), (1_000, 500));
    }

    #[test]
    fn refund_mirrors_deduct() {
        let (conn, fiefdom_id) = ledger_fixture();
        let ledger = ResourceLedger::new(&conn);
        let mut result = ActionResult::ok();

        let mut amounts = ResourceAmounts::new();
        amounts.insert(Resource::Mana, 40);
        ledger.refund(fiefdom_id, &amounts, &mut result).unwrap();

        let store = FiefdomStore::new(&conn);
        let balances = store.fetch_fiefdom_resources(fiefdom_id).unwrap().unwrap();
        assert_eq!(balances.mana, 40);
        assert_eq!(result.side_effects.len(), 1);
        assert_eq!(result.side_effects[0].to_value, 40);
    }
}

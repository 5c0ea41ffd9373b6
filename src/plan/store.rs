// src/plan/store.rs
use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::info;

use crate::config::PlanRecord;
use crate::error::EngineError;
use crate::plan::item::PlanItem;

/// What a reload actually did, for operator visibility.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReloadSummary {
    pub added: Vec<String>,
    pub updated: Vec<String>,
}

/// The set of tracked instruments, keyed by request id with a symbol index on
/// the side. Request ids are allocated monotonically from the base, so the
/// BTreeMap's key order is also insertion order; startup subscription and
/// shutdown cancellation walk it deterministically.
///
/// The store is the sole owner of `PlanItem` lifetimes; reload mutates items
/// in place and never deletes (disabling an instrument is the supported way
/// to retire it).
#[derive(Debug)]
pub struct TradingPlan {
    name: String,
    items: BTreeMap<i64, PlanItem>,
    by_symbol: HashMap<String, i64>,
    next_req_id: i64,
    discount_factor: Decimal,
}

impl TradingPlan {
    pub fn load(
        name: &str,
        base_req_id: i64,
        discount_factor: Decimal,
        records: &[PlanRecord],
    ) -> Result<Self, EngineError> {
        Self::validate_batch(records)?;

        let mut plan = Self {
            name: name.to_string(),
            items: BTreeMap::new(),
            by_symbol: HashMap::new(),
            next_req_id: base_req_id,
            discount_factor,
        };
        for record in records {
            plan.insert_new(record);
        }
        Ok(plan)
    }

    /// Merges a new set of records into the live plan. Existing symbols get
    /// their configured fields overwritten in place, unseen symbols are
    /// inserted with a fresh request id, and symbols absent from the batch
    /// are left alone. Validation runs over the whole batch first, so a bad
    /// record rejects the reload without touching anything.
    pub fn reload(&mut self, records: &[PlanRecord]) -> Result<ReloadSummary, EngineError> {
        Self::validate_batch(records)?;

        let mut summary = ReloadSummary::default();
        for record in records {
            match self.by_symbol.get(&record.symbol).copied() {
                Some(req_id) => {
                    if let Some(item) = self.items.get_mut(&req_id) {
                        item.apply_config(record, self.discount_factor);
                        summary.updated.push(record.symbol.clone());
                    }
                }
                None => {
                    self.insert_new(record);
                    summary.added.push(record.symbol.clone());
                }
            }
        }
        info!(
            plan = %self.name,
            added = summary.added.len(),
            updated = summary.updated.len(),
            "plan reloaded"
        );
        Ok(summary)
    }

    fn validate_batch(records: &[PlanRecord]) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for record in records {
            record.validate()?;
            if !seen.insert(record.symbol.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate symbol {} in plan",
                    record.symbol
                )));
            }
        }
        Ok(())
    }

    fn insert_new(&mut self, record: &PlanRecord) -> i64 {
        self.next_req_id += 1;
        let req_id = self.next_req_id;
        let item = PlanItem::new(record, req_id, self.discount_factor);
        self.by_symbol.insert(item.symbol.clone(), req_id);
        self.items.insert(req_id, item);
        req_id
    }

    pub fn get(&self, req_id: i64) -> Result<&PlanItem, EngineError> {
        self.items
            .get(&req_id)
            .ok_or(EngineError::UnknownRequestId(req_id))
    }

    pub fn get_mut(&mut self, req_id: i64) -> Result<&mut PlanItem, EngineError> {
        self.items
            .get_mut(&req_id)
            .ok_or(EngineError::UnknownRequestId(req_id))
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Result<&PlanItem, EngineError> {
        let req_id = self.req_id_for(symbol)?;
        self.get(req_id)
    }

    pub fn get_by_symbol_mut(&mut self, symbol: &str) -> Result<&mut PlanItem, EngineError> {
        let req_id = self.req_id_for(symbol)?;
        self.get_mut(req_id)
    }

    fn req_id_for(&self, symbol: &str) -> Result<i64, EngineError> {
        self.by_symbol
            .get(symbol)
            .copied()
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logs every plan row, the way the original program printed its plan at
    /// startup.
    pub fn log_plan(&self) {
        info!("trading plan {}:", self.name);
        for item in self.items.values() {
            info!("{item}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn factor() -> Decimal {
        Decimal::new(997, 3)
    }

    fn record(symbol: &str, buy: &str, long: i64) -> PlanRecord {
        PlanRecord {
            symbol: symbol.to_string(),
            enabled: true,
            target_buy_price: Decimal::from_str(buy).unwrap(),
            target_sell_price: None,
            target_long_pos: long,
            target_short_pos: 0,
            buy_attempt_limit: 3,
            sell_attempt_limit: 3,
        }
    }

    fn three_symbol_plan() -> TradingPlan {
        TradingPlan::load(
            "MarketWatcher",
            8800,
            factor(),
            &[
                record("FB", "152.00", 100),
                record("NVDA", "152.00", 200),
                record("QCOM", "63.80", 200),
            ],
        )
        .unwrap()
    }

    #[test]
    fn load_assigns_request_ids_in_record_order() {
        let plan = three_symbol_plan();
        let ids: Vec<(i64, String)> = plan
            .iter()
            .map(|item| (item.req_id, item.symbol.clone()))
            .collect();
        assert_eq!(
            ids,
            vec![
                (8801, "FB".to_string()),
                (8802, "NVDA".to_string()),
                (8803, "QCOM".to_string())
            ]
        );
    }

    #[test]
    fn load_rejects_duplicate_symbols() {
        let err = TradingPlan::load(
            "MarketWatcher",
            8800,
            factor(),
            &[record("FB", "152.00", 100), record("FB", "150.00", 50)],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn reload_adds_unseen_symbol_with_fresh_request_id() {
        let mut plan = three_symbol_plan();
        let summary = plan.reload(&[record("AMD", "99.00", 50)]).unwrap();
        assert_eq!(summary.added, vec!["AMD".to_string()]);
        assert!(summary.updated.is_empty());

        let item = plan.get_by_symbol("AMD").unwrap();
        assert_eq!(item.req_id, 8804);
        assert_eq!(item.buy_attempted, 0);
        assert_eq!(item.sell_attempted, 0);
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn reload_preserves_runtime_state_on_existing_symbol() {
        let mut plan = three_symbol_plan();
        {
            let item = plan.get_by_symbol_mut("FB").unwrap();
            item.buy_attempted = 2;
            item.sell_attempted = 1;
            item.previous_price = Some(Decimal::from_str("151.50").unwrap());
            item.latest_pos = 40;
            item.previous_pos = 20;
            item.position_initialized = true;
            item.opening_price = Some(Decimal::from_str("149.90").unwrap());
            item.pending_order_id = Some(77);
        }

        let mut updated = record("FB", "160.00", 300);
        updated.enabled = false;
        let summary = plan.reload(&[updated]).unwrap();
        assert_eq!(summary.updated, vec!["FB".to_string()]);

        let item = plan.get_by_symbol("FB").unwrap();
        // Configured fields follow the new record.
        assert!(!item.enabled);
        assert_eq!(item.target_buy_price, Decimal::from_str("160.00").unwrap());
        assert_eq!(item.target_long_pos, 300);
        assert_eq!(
            item.target_sell_price,
            Decimal::from_str("159.52").unwrap()
        );
        // Runtime fields are untouched.
        assert_eq!(item.req_id, 8801);
        assert_eq!(item.buy_attempted, 2);
        assert_eq!(item.sell_attempted, 1);
        assert_eq!(item.previous_price, Some(Decimal::from_str("151.50").unwrap()));
        assert_eq!(item.latest_pos, 40);
        assert_eq!(item.previous_pos, 20);
        assert!(item.position_initialized);
        assert_eq!(item.opening_price, Some(Decimal::from_str("149.90").unwrap()));
        assert_eq!(item.pending_order_id, Some(77));
    }

    #[test]
    fn reload_leaves_absent_symbols_untouched() {
        let mut plan = three_symbol_plan();
        plan.reload(&[record("FB", "160.00", 300)]).unwrap();
        assert_eq!(plan.len(), 3);
        let nvda = plan.get_by_symbol("NVDA").unwrap();
        assert_eq!(nvda.target_buy_price, Decimal::from_str("152.00").unwrap());
    }

    #[test]
    fn bad_record_rejects_the_whole_reload() {
        let mut plan = three_symbol_plan();
        let mut bad = record("AMD", "99.00", 50);
        bad.target_short_pos = 10;
        let err = plan
            .reload(&[record("FB", "160.00", 300), bad])
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));

        // Nothing was applied, not even the valid leading record.
        assert_eq!(plan.len(), 3);
        let fb = plan.get_by_symbol("FB").unwrap();
        assert_eq!(fb.target_buy_price, Decimal::from_str("152.00").unwrap());
    }

    #[test]
    fn lookups_fail_cleanly() {
        let plan = three_symbol_plan();
        assert!(matches!(
            plan.get(9999),
            Err(EngineError::UnknownRequestId(9999))
        ));
        assert!(matches!(
            plan.get_by_symbol("TSLA"),
            Err(EngineError::UnknownSymbol(_))
        ));
    }
}

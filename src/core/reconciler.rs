// src/core/reconciler.rs
use tracing::{debug, info};

use crate::plan::item::PlanItem;

/// Folds a broker position report into the item. The first report seeds both
/// the latest and the previous position; every later one shifts latest into
/// previous before storing the new value.
///
/// With `reset_on_progress` enabled, a position that moved in the desired
/// direction clears that direction's attempt counter. Otherwise counters are
/// only ever changed by a reload or an operator action.
pub fn reconcile(item: &mut PlanItem, reported: i64, reset_on_progress: bool) {
    if item.position_initialized {
        item.previous_pos = item.latest_pos;
        item.latest_pos = reported;
    } else {
        item.position_initialized = true;
        item.previous_pos = reported;
        item.latest_pos = reported;
    }
    debug!(
        symbol = %item.symbol,
        latest_pos = item.latest_pos,
        previous_pos = item.previous_pos,
        "position reconciled"
    );

    if reset_on_progress {
        if item.latest_pos > item.previous_pos && item.buy_attempted != 0 {
            info!(symbol = %item.symbol, "position rose; buy attempt counter reset");
            item.buy_attempted = 0;
        } else if item.latest_pos < item.previous_pos && item.sell_attempted != 0 {
            info!(symbol = %item.symbol, "position fell; sell attempt counter reset");
            item.sell_attempted = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::config::PlanRecord;

    use super::*;

    fn item() -> PlanItem {
        let record = PlanRecord {
            symbol: "QCOM".to_string(),
            enabled: true,
            target_buy_price: Decimal::from_str("63.80").unwrap(),
            target_sell_price: None,
            target_long_pos: 200,
            target_short_pos: 0,
            buy_attempt_limit: 3,
            sell_attempt_limit: 3,
        };
        PlanItem::new(&record, 8803, Decimal::new(997, 3))
    }

    #[test]
    fn first_report_seeds_both_positions() {
        let mut item = item();
        reconcile(&mut item, 50, false);
        assert!(item.position_initialized);
        assert_eq!(item.latest_pos, 50);
        assert_eq!(item.previous_pos, 50);
    }

    #[test]
    fn later_reports_shift_latest_into_previous() {
        let mut item = item();
        reconcile(&mut item, 50, false);
        reconcile(&mut item, 70, false);
        assert_eq!(item.previous_pos, 50);
        assert_eq!(item.latest_pos, 70);
    }

    #[test]
    fn counters_untouched_by_default() {
        let mut item = item();
        item.buy_attempted = 2;
        item.sell_attempted = 1;
        reconcile(&mut item, 50, false);
        reconcile(&mut item, 70, false);
        assert_eq!(item.buy_attempted, 2);
        assert_eq!(item.sell_attempted, 1);
    }

    #[test]
    fn progress_resets_only_the_matching_counter() {
        let mut item = item();
        item.buy_attempted = 2;
        item.sell_attempted = 1;
        reconcile(&mut item, 50, true);
        // Position rose from 50 to 70: buy side made progress.
        reconcile(&mut item, 70, true);
        assert_eq!(item.buy_attempted, 0);
        assert_eq!(item.sell_attempted, 1);

        item.sell_attempted = 1;
        reconcile(&mut item, 40, true);
        assert_eq!(item.sell_attempted, 0);
    }
}
